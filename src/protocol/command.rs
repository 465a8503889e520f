//! Command parsing
//!
//! Turns a raw command line into a typed command, or `None` when the line
//! is ill-formed.

/// Longest accepted name, value, or path token, in bytes.
pub const MAX_TOKEN_LEN: usize = 255;

/// A parsed client command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look up a name
    Query { name: String },

    /// Insert a name/value pair
    Add { name: String, value: String },

    /// Remove a name
    Remove { name: String },

    /// Interpret each line of a file
    BatchFile { path: String },
}

/// Parse one newline-free command line.
///
/// The selector is the line's first byte, uninterpreted: a leading space
/// is ill-formed, not skipped. Extra trailing tokens are ignored.
pub fn parse(line: &str) -> Option<Command> {
    if line.len() <= 1 {
        return None;
    }

    // The selector byte is ASCII for every known command, so slicing the
    // rest at offset 1 is safe exactly when the selector matches.
    let selector = line.as_bytes()[0];
    let rest = match selector {
        b'q' | b'a' | b'd' | b'f' => &line[1..],
        _ => return None,
    };
    let mut tokens = rest.split_whitespace();

    match selector {
        b'q' => Some(Command::Query {
            name: field(tokens.next())?,
        }),
        b'a' => Some(Command::Add {
            name: field(tokens.next())?,
            value: field(tokens.next())?,
        }),
        b'd' => Some(Command::Remove {
            name: field(tokens.next())?,
        }),
        b'f' => Some(Command::BatchFile {
            path: field(tokens.next())?,
        }),
        _ => unreachable!("selector matched above"),
    }
}

fn field(token: Option<&str>) -> Option<String> {
    let token = token?;
    if token.len() > MAX_TOKEN_LEN {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        assert_eq!(
            parse("q foo"),
            Some(Command::Query {
                name: "foo".to_string()
            })
        );
    }

    #[test]
    fn test_parse_add() {
        assert_eq!(
            parse("a foo 1"),
            Some(Command::Add {
                name: "foo".to_string(),
                value: "1".to_string()
            })
        );
    }

    #[test]
    fn test_extra_tokens_ignored() {
        assert_eq!(
            parse("d foo bar"),
            Some(Command::Remove {
                name: "foo".to_string()
            })
        );
    }

    #[test]
    fn test_short_lines_rejected() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("q"), None);
    }

    #[test]
    fn test_missing_arguments_rejected() {
        assert_eq!(parse("q "), None);
        assert_eq!(parse("a foo"), None);
    }

    #[test]
    fn test_unknown_selector_rejected() {
        assert_eq!(parse("x foo"), None);
        // A leading space is not skipped.
        assert_eq!(parse(" q foo"), None);
    }

    #[test]
    fn test_token_length_bound() {
        let name_255 = "n".repeat(255);
        let name_256 = "n".repeat(256);
        assert!(parse(&format!("q {name_255}")).is_some());
        assert_eq!(parse(&format!("q {name_256}")), None);
    }

    #[test]
    fn test_multibyte_selector_rejected() {
        assert_eq!(parse("é foo"), None);
    }
}
