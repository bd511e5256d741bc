use std::backtrace::Backtrace;
use std::fmt;

/// Script-level error value: a name, a message, and optional stack text.
///
/// The stack is rendered to text at construction time so it travels verbatim
/// through serialization; an error rebuilt from a document displays the frames
/// of the process that originally raised it, not the frames of the rebuild
/// site.
#[derive(Debug, PartialEq, Eq)]
pub struct ScriptError {
    name: String,
    message: String,
    stack: Option<String>,
}

impl ScriptError {
    /// Creates an error named `Error`, capturing the current call stack.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_name("Error", message)
    }

    /// Creates an error with an explicit name, capturing the current call stack.
    pub fn with_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: Some(render_stack(&Backtrace::force_capture())),
        }
    }

    /// Creates an error carrying pre-rendered stack text, or none at all.
    ///
    /// This is the rebuild-side constructor: transported stack text is spliced
    /// in unchanged instead of capturing the local stack.
    pub fn with_stack(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack,
        }
    }

    /// Error name, `Error` unless constructed otherwise.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Rendered stack text, if any was captured or transported.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Renders a captured backtrace as a `Stack trace:` header followed by
/// `  at symbol (location)` frame lines.
fn render_stack(backtrace: &Backtrace) -> String {
    let mut out = String::from("Stack trace:");
    for line in backtrace.to_string().lines() {
        let line = line.trim_start();
        if let Some(location) = line.strip_prefix("at ") {
            // Location lines follow the frame they belong to.
            out.push_str(" (");
            out.push_str(location);
            out.push(')');
        } else if let Some((index, symbol)) = line.split_once(": ")
            && index.bytes().all(|byte| byte.is_ascii_digit())
        {
            out.push_str("\n  at ");
            out.push_str(symbol);
        }
    }
    out
}
