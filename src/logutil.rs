//! Helpers for putting user-supplied text into log lines.
//!
//! Chat users control item names, cow nicknames and raw command text. Before
//! any of it reaches a log line it goes through [`escape_log`] so one message
//! stays one line and a pasted wall of text cannot flood the log.

use std::fmt::Write;

/// Longest preview of user text written to the log, in characters.
pub const LOG_PREVIEW_CHARS: usize = 120;

/// Escape control characters and cap the length at [`LOG_PREVIEW_CHARS`].
///
/// Newlines, carriage returns and tabs become `\n`, `\r` and `\t`; backslashes
/// are doubled; any other control character is written as `\u{..}`.
pub fn escape_log(s: &str) -> String {
    escape_log_with_limit(s, LOG_PREVIEW_CHARS)
}

pub fn escape_log_with_limit(s: &str, limit: usize) -> String {
    let mut out = String::with_capacity(s.len().min(limit) + 4);
    for (taken, ch) in s.chars().enumerate() {
        if taken == limit {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_input_stays_on_one_line() {
        assert_eq!(escape_log("buy\ncoffee\t\\x"), "buy\\ncoffee\\t\\\\x");
        assert_eq!(escape_log("a\u{7}b"), "a\\u{7}b");
    }

    #[test]
    fn long_input_is_cut() {
        let long = "m".repeat(500);
        let escaped = escape_log(&long);
        assert_eq!(escaped.chars().count(), LOG_PREVIEW_CHARS + 1);
        assert!(escaped.ends_with('…'));
        assert_eq!(escape_log_with_limit("abc", 3), "abc");
    }
}
