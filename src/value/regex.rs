use std::cell::Cell;
use std::fmt;

use regex::{Match, Regex, RegexBuilder};

/// Regex value with script-engine match state.
///
/// Alongside the compiled pattern this keeps the flag string it was built from
/// and a mutable cursor (`last_index`), so a transported regex resumes
/// matching exactly where the original stopped.
#[derive(Debug)]
pub struct ScriptRegex {
    source: String,
    flags: String,
    regex: Regex,
    last_index: Cell<usize>,
}

impl ScriptRegex {
    /// Compiles `source` under a script-style flag string.
    ///
    /// `i`, `m`, `s`, and `x` map to the corresponding engine switches. The
    /// cursor and unicode-mode letters (`g`, `y`, `u`, `d`, `v`) carry no
    /// switch here; they are kept in [`flags`](Self::flags) so a round-tripped
    /// regex reports them unchanged. Any other letter is rejected.
    pub fn new(source: &str, flags: &str) -> Result<Self, String> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'x' => {
                    builder.ignore_whitespace(true);
                }
                'g' | 'y' | 'u' | 'd' | 'v' => {}
                other => return Err(format!("unsupported regex flag {other:?}")),
            }
        }
        let regex = builder.build().map_err(|error| error.to_string())?;
        Ok(Self {
            source: source.to_string(),
            flags: flags.to_string(),
            regex,
            last_index: Cell::new(0),
        })
    }

    /// Pattern text the regex was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Flag string the regex was compiled with.
    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Current cursor, a byte offset into the next haystack.
    pub fn last_index(&self) -> usize {
        self.last_index.get()
    }

    /// Moves the cursor. The value is a byte offset; an offset past the end of
    /// a haystack makes the next [`find_next`](Self::find_next) miss and reset.
    pub fn set_last_index(&self, index: usize) {
        self.last_index.set(index);
    }

    /// Finds the next match at or after the cursor, advancing it the way a
    /// script engine's `exec` does: to the match end on a hit, back to zero on
    /// a miss.
    pub fn find_next<'h>(&self, haystack: &'h str) -> Option<Match<'h>> {
        let start = self.last_index.get();
        if start > haystack.len() {
            self.last_index.set(0);
            return None;
        }
        match self.regex.find_at(haystack, start) {
            Some(found) => {
                self.last_index.set(found.end());
                Some(found)
            }
            None => {
                self.last_index.set(0);
                None
            }
        }
    }

    /// Whether the pattern matches anywhere in `haystack`, ignoring the cursor.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

/// Compares pattern, flags, and cursor; the compiled engine is derived state.
impl PartialEq for ScriptRegex {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.flags == other.flags
            && self.last_index == other.last_index
    }
}

impl Eq for ScriptRegex {}

impl fmt::Display for ScriptRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}
