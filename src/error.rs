use thiserror::Error;

/// Failures while serializing a value graph.
///
/// Serialization is total over supported and unsupported values alike
/// (unconvertible inputs degrade, they do not fail); the only failure mode is
/// resource exhaustion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// The value graph nests deeper than the configured bound.
    #[error("value graph exceeds the maximum serialization depth of {0}")]
    DepthLimitExceeded(usize),
}

/// Failures while reconstructing a value graph from a document.
///
/// Content problems (unknown tags, payloads a converter rejects) degrade to
/// plain data and are not errors; these variants cover structural problems
/// only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The document nests deeper than the configured bound.
    #[error("document exceeds the maximum deserialization depth of {0}")]
    DepthLimitExceeded(usize),

    /// A pointer names a reference id that no node in the document carries.
    #[error("pointer targets reference id {0}, which no node in the document carries")]
    DanglingPointer(u64),
}

/// Failures while registering a converter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The tag is already taken by an earlier registration.
    #[error("type tag {0:?} is already registered")]
    DuplicateTag(String),
}
