//! Regex patterns built from user input (directive prefixes and macro patterns).
//!
//! Patterns go through `fancy_regex` so that macros can use backreferences and
//! lookaround. Compilation and matching errors are returned as [`PatternError`]
//! instead of panicking, because the pattern text comes from the preprocessed file.

use fancy_regex::{Captures, Expander, Regex as FancyRegex};
use thiserror::Error;

/// Inline flags applied to a compiled pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    /// Whitespace in the pattern is ignored and `#` starts a comment.
    pub extended: bool,
}

impl PatternFlags {
    pub const NONE: PatternFlags = PatternFlags {
        case_insensitive: false,
        multi_line: false,
        dot_matches_new_line: false,
        extended: false,
    };

    pub const EXTENDED: PatternFlags = PatternFlags {
        extended: true,
        ..PatternFlags::NONE
    };

    pub fn multi_line(mut self) -> Self {
        self.multi_line = true;
        self
    }

    fn inline_prefix(self) -> String {
        let mut flags = String::new();
        if self.case_insensitive {
            flags.push('i');
        }
        if self.multi_line {
            flags.push('m');
        }
        if self.dot_matches_new_line {
            flags.push('s');
        }
        if self.extended {
            flags.push('x');
        }
        if flags.is_empty() {
            flags
        } else {
            format!("(?{flags})")
        }
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid pattern '{pattern}': {source}")]
    Syntax {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },
    #[error("pattern '{pattern}' failed while matching: {source}")]
    Execution {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },
}

/// A compiled pattern together with the source text it was built from.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: FancyRegex,
}

impl Pattern {
    pub fn compile(pattern: &str, flags: PatternFlags) -> Result<Self, PatternError> {
        let full = format!("{}{pattern}", flags.inline_prefix());
        let regex = FancyRegex::new(&full).map_err(|e| PatternError::Syntax {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The first match in `text`.
    pub fn captures<'t>(&self, text: &'t str) -> Result<Option<PatternCaptures<'t>>, PatternError> {
        self.captures_from(text, 0)
    }

    /// The first match in `text` starting at or after byte offset `from`.
    pub fn captures_from<'t>(&self, text: &'t str, from: usize) -> Result<Option<PatternCaptures<'t>>, PatternError> {
        self.regex
            .captures_from_pos(text, from)
            .map(|caps| caps.map(|captures| PatternCaptures { captures }))
            .map_err(|e| PatternError::Execution {
                pattern: self.source.clone(),
                source: Box::new(e),
            })
    }

    pub fn is_match(&self, text: &str) -> Result<bool, PatternError> {
        self.regex.is_match(text).map_err(|e| PatternError::Execution {
            pattern: self.source.clone(),
            source: Box::new(e),
        })
    }
}

/// A successful match and its capture groups.
#[derive(Debug)]
pub struct PatternCaptures<'t> {
    captures: Captures<'t>,
}

impl<'t> PatternCaptures<'t> {
    pub fn start(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.start())
    }

    pub fn end(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.end())
    }

    pub fn is_empty(&self) -> bool {
        self.start() == self.end()
    }

    pub fn name(&self, name: &str) -> Option<&'t str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    /// Expand `$1`, `${name}` and `$$` references in `template` against this match.
    ///
    /// A bare `$<digits>` takes as many digits as still name an existing group, and
    /// the text after it is literal: with one group, `$1b` is group 1 then `b`, and
    /// `$12` is group 1 then `2`. Named groups need braces.
    pub fn expand(&self, template: &str) -> String {
        Expander::default().expansion(&self.brace_numbered_refs(template), &self.captures)
    }

    /// Rewrite bare `$<digits>` references as `${<digits>}`.
    fn brace_numbered_refs(&self, template: &str) -> String {
        let groups = self.captures.len().saturating_sub(1);
        let bytes = template.as_bytes();
        let mut out = String::with_capacity(template.len() + 4);
        let mut copied = 0;
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }
            match bytes.get(i + 1) {
                Some(b'$') => i += 2,
                Some(digit) if digit.is_ascii_digit() => {
                    let mut number = usize::from(digit - b'0');
                    let mut end = i + 2;
                    while let Some(next) = bytes.get(end).filter(|b| b.is_ascii_digit()) {
                        let longer = number * 10 + usize::from(next - b'0');
                        if longer > groups {
                            break;
                        }
                        number = longer;
                        end += 1;
                    }
                    out.push_str(&template[copied..i]);
                    out.push_str(&format!("${{{number}}}"));
                    copied = end;
                    i = end;
                }
                _ => i += 1,
            }
        }
        out.push_str(&template[copied..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_prefix() {
        assert_eq!(PatternFlags::NONE.inline_prefix(), "");
        assert_eq!(PatternFlags::EXTENDED.multi_line().inline_prefix(), "(?mx)");
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = Pattern::compile("a(b", PatternFlags::NONE).unwrap_err();
        assert!(matches!(err, PatternError::Syntax { .. }));
        assert!(err.to_string().contains("a(b"));
    }

    #[test]
    fn test_named_groups_and_expansion() {
        let pattern = Pattern::compile(r"(?P<word>\w+)=(\d+)", PatternFlags::NONE).unwrap();
        let caps = pattern.captures("set x=42;").unwrap().unwrap();
        assert_eq!((caps.start(), caps.end()), (4, 8));
        assert_eq!(caps.name("word"), Some("x"));
        assert_eq!(caps.expand("$2 -> ${word}"), "42 -> x");
    }

    #[test]
    fn test_numbered_reference_followed_by_text() {
        let pattern = Pattern::compile("(a)", PatternFlags::NONE).unwrap();
        let caps = pattern.captures("a").unwrap().unwrap();
        assert_eq!(caps.expand("$1b"), "ab");
        assert_eq!(caps.expand("$12"), "a2");
        assert_eq!(caps.expand("${1}b"), "ab");
        assert_eq!(caps.expand("$$1"), "$1");
        assert_eq!(caps.expand("$0$1"), "aa");
    }

    #[test]
    fn test_numbered_reference_takes_longest_group() {
        let pattern = Pattern::compile("(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)(l)", PatternFlags::NONE).unwrap();
        let caps = pattern.captures("abcdefghijkl").unwrap().unwrap();
        assert_eq!(caps.expand("$12"), "l");
        assert_eq!(caps.expand("$13"), "a3");
    }

    #[test]
    fn test_extended_mode_ignores_whitespace() {
        let pattern = Pattern::compile(r" a \s b ", PatternFlags::EXTENDED).unwrap();
        assert!(pattern.is_match("a b").unwrap());
        assert!(pattern.is_match("a\tb").unwrap());
        assert!(!pattern.is_match("ab").unwrap());
    }

    #[test]
    fn test_backreference_support() {
        let pattern = Pattern::compile(r"(\w)\1", PatternFlags::NONE).unwrap();
        let caps = pattern.captures("abccd").unwrap().unwrap();
        assert_eq!(caps.start(), 2);
    }

    #[test]
    fn test_captures_from_offset() {
        let pattern = Pattern::compile("x", PatternFlags::NONE).unwrap();
        let caps = pattern.captures_from("x_x", 1).unwrap().unwrap();
        assert_eq!(caps.start(), 2);
    }
}
