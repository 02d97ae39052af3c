//! Parses make-style dep-info files (the output of `-MM -MT 'x ' -MF`):
//! tokenizes on whitespace, honors `$$` and backslash escaping, and asserts
//! the file opens with the literal tokens `x` `:` before returning the
//! remaining tokens as discovered header paths.

use crate::error::BuildError;

/// Tokenize a dep-info file's contents. Space, tab, and newline separate
/// tokens; `$$` decodes to a literal `$`; a backslash before a newline is a
/// line continuation (both characters are dropped); a backslash before any
/// other character escapes it into the token literally (including a space).
fn tokenize(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(other) => {
                    current.push(other);
                    in_token = true;
                }
                None => {}
            },
            '$' if chars.peek() == Some(&'$') => {
                chars.next();
                current.push('$');
                in_token = true;
            }
            other => {
                current.push(other);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Parse a dep-info file's contents into the sorted, deduplicated list of
/// header paths it names, after the mandatory leading `x :` tokens.
pub fn parse(content: &str) -> Result<Vec<String>, BuildError> {
    let tokens = tokenize(content);
    if tokens.len() < 2 || tokens[0] != "x" || tokens[1] != ":" {
        return Err(BuildError::new(
            "dependency file does not start with the expected 'x :' tokens",
        ));
    }

    let mut headers: Vec<String> = tokens[2..].to_vec();
    headers.sort();
    headers.dedup();
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_simple_dep_file() {
        let content = "x : a.h b.h\n";
        assert_eq!(parse(content).unwrap(), vec!["a.h".to_string(), "b.h".to_string()]);
    }

    #[test]
    fn line_continuation_joins_headers() {
        let content = "x : a.h \\\n  b.h\n";
        assert_eq!(parse(content).unwrap(), vec!["a.h".to_string(), "b.h".to_string()]);
    }

    #[test]
    fn escaped_space_stays_in_one_token() {
        let content = "x : a\\ dir/b.h\n";
        assert_eq!(parse(content).unwrap(), vec!["a dir/b.h".to_string()]);
    }

    #[test]
    fn dollar_dollar_decodes_to_dollar() {
        let content = "x : $$include/a.h\n";
        assert_eq!(parse(content).unwrap(), vec!["$include/a.h".to_string()]);
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let content = "x : b.h a.h a.h\n";
        assert_eq!(parse(content).unwrap(), vec!["a.h".to_string(), "b.h".to_string()]);
    }

    #[test]
    fn rejects_file_without_leading_x_colon() {
        let content = "a.o: a.h\n";
        assert!(parse(content).is_err());
    }
}
