use thiserror::Error;

/// A single lexical token together with its byte offset in the source string.
pub type Spanned = (usize, Token);

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("invalid number '{text}' at offset {offset}")]
    InvalidNumber { offset: usize, text: String },

    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { offset: usize, ch: char },
}

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, LexError> {
    let mut tokens = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i] as char;
        match ch {
            c if c.is_ascii_whitespace() => i += 1,
            '+' => {
                tokens.push((i, Token::Plus));
                i += 1;
            }
            '-' => {
                tokens.push((i, Token::Minus));
                i += 1;
            }
            '*' => {
                tokens.push((i, Token::Star));
                i += 1;
            }
            '/' => {
                tokens.push((i, Token::Slash));
                i += 1;
            }
            '^' => {
                tokens.push((i, Token::Caret));
                i += 1;
            }
            '(' => {
                tokens.push((i, Token::LParen));
                i += 1;
            }
            ')' => {
                tokens.push((i, Token::RParen));
                i += 1;
            }
            ',' => {
                tokens.push((i, Token::Comma));
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                i = scan_number(bytes, i);
                let text = &src[start..i];
                let value = text.parse::<f64>().map_err(|_| LexError::InvalidNumber {
                    offset: start,
                    text: text.to_string(),
                })?;
                tokens.push((start, Token::Number(value)));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_ascii_alphanumeric() || c == '_' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push((start, Token::Ident(src[start..i].to_string())));
            }
            c => return Err(LexError::UnexpectedChar { offset: i, ch: c }),
        }
    }

    Ok(tokens)
}

/// Scans past the digits, decimal point, and optional exponent of a numeric
/// literal starting at `i`, returning the exclusive end offset.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_operators_and_parentheses() {
        let tokens = tokenize("(+-*/^,)").unwrap();
        let kinds: Vec<Token> = tokens.into_iter().map(|(_, t)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::LParen,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Caret,
                Token::Comma,
                Token::RParen,
            ]
        );
    }

    #[test]
    fn tokenizes_numbers_including_scientific_notation() {
        let tokens = tokenize("1 2.5 1e-3 4.2E+6 .5").unwrap();
        let values: Vec<f64> = tokens
            .into_iter()
            .map(|(_, t)| match t {
                Token::Number(v) => v,
                other => panic!("expected number, got {:?}", other),
            })
            .collect();
        assert_eq!(values, vec![1.0, 2.5, 1e-3, 4.2e6, 0.5]);
    }

    #[test]
    fn tokenizes_identifiers_with_underscores_and_digits() {
        let tokens = tokenize("P_load5").unwrap();
        assert_eq!(tokens, vec![(0, Token::Ident("P_load5".to_string()))]);
    }

    #[test]
    fn exponent_without_digits_is_treated_as_identifier_suffix() {
        // "2e" lexes as the number 2 followed by the identifier "e".
        let tokens = tokenize("2e").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].1, Token::Number(2.0));
        assert_eq!(tokens[1].1, Token::Ident("e".to_string()));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = tokenize("1.2.3").unwrap_err();
        assert!(matches!(err, LexError::InvalidNumber { offset: 0, .. }));
    }

    #[test]
    fn rejects_unexpected_characters() {
        let err = tokenize("a ? b").unwrap_err();
        assert_eq!(err, LexError::UnexpectedChar { offset: 2, ch: '?' });
    }
}
