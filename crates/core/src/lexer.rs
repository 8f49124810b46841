use serde::Serialize;

use crate::error::DirectorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Token {
    /// Uppercased run of word characters, `#` and `!`.
    Word(String),
    /// Bracketed or parenthesized group kept whole, e.g. `[3,12]`.
    Group(String),
    /// Double-quoted literal, quotes included, escapes resolved.
    Quoted(String),
}

impl Token {
    pub fn as_str(&self) -> &str {
        match self {
            Token::Word(s) | Token::Group(s) | Token::Quoted(s) => s,
        }
    }

    pub fn is_word(&self, w: &str) -> bool {
        matches!(self, Token::Word(x) if x == w)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    /// 1-based character column of the token's first character.
    pub column: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '#' || c == '!'
}

/// Split a raw command into tokens.
///
/// Anything that is not part of a word, group or quoted literal acts as a
/// separator, so stray punctuation such as commas and periods disappears.
pub fn lex(src: &str) -> Result<Vec<Spanned>, DirectorError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        let column = pos + 1;

        // Quoted literal
        if c == '"' {
            let mut s = String::from('"');
            pos += 1;
            loop {
                if pos >= chars.len() {
                    return Err(DirectorError::malformed(
                        column,
                        "unterminated string literal",
                        src,
                    ));
                }
                let sc = chars[pos];
                if sc == '\\' {
                    pos += 1;
                    if pos >= chars.len() {
                        return Err(DirectorError::malformed(
                            column,
                            "unterminated escape in string",
                            src,
                        ));
                    }
                    match chars[pos] {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        other => s.push(other),
                    }
                    pos += 1;
                    continue;
                }
                s.push(sc);
                pos += 1;
                if sc == '"' {
                    break;
                }
            }
            tokens.push(Spanned {
                token: Token::Quoted(s),
                column,
            });
            continue;
        }

        // Bracketed or parenthesized group
        if c == '[' || c == '(' {
            let close = if c == '[' { ']' } else { ')' };
            let start = pos;
            while pos < chars.len() && chars[pos] != close {
                pos += 1;
            }
            if pos >= chars.len() {
                return Err(DirectorError::malformed(
                    column,
                    format!("unterminated group, expected '{}'", close),
                    src,
                ));
            }
            pos += 1; // consume closing bracket
            let group: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Group(group.to_uppercase()),
                column,
            });
            continue;
        }

        // Word, including decimal amounts like 1.5 and signed numbers like -2
        if is_word_char(c)
            || (c == '-' && pos + 1 < chars.len() && chars[pos + 1].is_ascii_digit())
        {
            let start = pos;
            pos += 1;
            while pos < chars.len() {
                let wc = chars[pos];
                let decimal_point = wc == '.'
                    && chars[pos - 1].is_ascii_digit()
                    && pos + 1 < chars.len()
                    && chars[pos + 1].is_ascii_digit();
                if is_word_char(wc) || decimal_point {
                    pos += 1;
                } else {
                    break;
                }
            }
            let word: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::Word(word.to_uppercase()),
                column,
            });
            continue;
        }

        // Whitespace and stray punctuation
        pos += 1;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &str) -> Vec<String> {
        lex(src)
            .unwrap()
            .into_iter()
            .map(|s| s.token.as_str().to_owned())
            .collect()
    }

    #[test]
    fn simple_words_match_whitespace_split() {
        let src = "direct Player to move north";
        let expected: Vec<String> = src.split_whitespace().map(str::to_uppercase).collect();
        assert_eq!(texts(src), expected);
    }

    #[test]
    fn coordinate_groups_survive_whole() {
        let tokens = lex("MOVE TO [3, 12] now").unwrap();
        assert_eq!(tokens[2].token, Token::Group("[3, 12]".into()));
        assert_eq!(tokens[2].column, 9);
        assert_eq!(tokens.len(), 4);
    }

    #[test]
    fn quoted_strings_keep_quotes_and_inner_spaces() {
        let tokens = lex(r#"SAY "hello \"there\" friend" LOUDLY"#).unwrap();
        assert_eq!(
            tokens[1].token,
            Token::Quoted(r#""hello "there" friend""#.into())
        );
        assert!(tokens[2].token.is_word("LOUDLY"));
    }

    #[test]
    fn markers_and_numbers_stay_in_words() {
        assert_eq!(
            texts("halt! #12 wait 1.5 seconds, then -2"),
            vec!["HALT!", "#12", "WAIT", "1.5", "SECONDS", "THEN", "-2"]
        );
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let err = lex(r#"MOVE "nowhere"#).unwrap_err();
        assert!(matches!(err, DirectorError::Malformed { column: 6, .. }));
    }

    #[test]
    fn unterminated_group_is_malformed() {
        assert!(matches!(
            lex("MOVE TO [3,12"),
            Err(DirectorError::Malformed { .. })
        ));
    }
}
