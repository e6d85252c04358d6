//! Wire-format finalization for outbound records.
//!
//! The collector speaks a line protocol: every record is one
//! token-prefixed, newline-terminated line. Embedded newlines in the
//! payload are rewritten to U+2028 LINE SEPARATOR so a single record can
//! never span (or split into) multiple wire lines.

/// Replacement for embedded newlines in a payload.
pub const LINE_SEPARATOR: char = '\u{2028}';

/// Produce the exact bytes shipped for one record:
/// `<token> <payload-with-newlines-rewritten>\n`.
pub fn finalize(token: &str, payload: &str) -> String {
    let mut line = String::with_capacity(token.len() + payload.len() + 2);
    line.push_str(token);
    line.push(' ');
    for ch in payload.chars() {
        line.push(if ch == '\n' { LINE_SEPARATOR } else { ch });
    }
    line.push('\n');
    line
}

/// Whether `token` has the expected 8-4-4-4-12 lowercase-hex shape.
///
/// Tokens are never validated; a mismatch only produces malformed output.
/// The builder uses this check to emit a debug-level note.
pub(crate) fn looks_like_token(token: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let mut parts = token.split('-');
    for expected in GROUPS {
        let Some(part) = parts.next() else {
            return false;
        };
        if part.len() != expected || !part.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return false;
        }
    }
    parts.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";

    #[test]
    fn prefixes_token_and_terminates_line() {
        assert_eq!(finalize(TOKEN, "hello"), format!("{TOKEN} hello\n"));
    }

    #[test]
    fn rewrites_embedded_newlines() {
        let line = finalize(TOKEN, "first\nsecond");
        assert_eq!(line, format!("{TOKEN} first\u{2028}second\n"));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn accepts_well_formed_tokens() {
        assert!(looks_like_token(TOKEN));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!looks_like_token(""));
        assert!(!looks_like_token("a1b2c3d4"));
        assert!(!looks_like_token("A1B2C3D4-E5F6-7890-ABCD-EF1234567890"));
        assert!(!looks_like_token("a1b2c3d4-e5f6-7890-abcd-ef12345678"));
        assert!(!looks_like_token("a1b2c3d4-e5f6-7890-abcd-ef1234567890-ffff"));
        assert!(!looks_like_token("g1b2c3d4-e5f6-7890-abcd-ef1234567890"));
    }
}
