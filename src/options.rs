/// Depth bound applied by both walks when none is configured.
///
/// serde_json enforces the same limit while parsing nested text, so documents
/// produced under the default survive the text leg without tuning either side.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for one serialization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Include captured stack text when serializing errors.
    pub stack: bool,
    /// Nesting depth at which the pass aborts with a depth error.
    pub max_depth: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            stack: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Options for one deserialization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeserializeOptions {
    /// Nesting depth at which the pass aborts with a depth error.
    pub max_depth: usize,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
