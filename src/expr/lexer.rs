//! Tokenizer for filter expressions.

use super::Error;

/// A single token of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    Minus,
    In,
}

impl Token {
    /// Whether the token can end an operand, in which case a following `.`
    /// is a member access and not the start of a number.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::Str(_)
                | Token::Ident(_)
                | Token::RParen
                | Token::RBracket
        )
    }
}

/// Split `input` into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let chars = input.chars().collect::<Vec<_>>();
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let next = chars.get(pos + 1).copied();
        match c {
            c if c.is_whitespace() => pos += 1,
            '0'..='9' => {
                let (number, end) = lex_number(&chars, pos)?;
                tokens.push(Token::Number(number));
                pos = end;
            }
            '.' if next.map(|n| n.is_ascii_digit()).unwrap_or(false)
                && !tokens.last().map(Token::ends_operand).unwrap_or(false) =>
            {
                let (number, end) = lex_number(&chars, pos)?;
                tokens.push(Token::Number(number));
                pos = end;
            }
            '.' => {
                tokens.push(Token::Dot);
                pos += 1;
            }
            '\'' | '"' => {
                let (s, end) = lex_string(&chars, pos)?;
                tokens.push(Token::Str(s));
                pos = end;
            }
            ',' => {
                tokens.push(Token::Comma);
                pos += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                pos += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::EqEq);
                pos += 2;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::NotEq);
                pos += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                pos += 1;
            }
            '<' if next == Some('=') => {
                tokens.push(Token::Le);
                pos += 2;
            }
            '<' => {
                tokens.push(Token::Lt);
                pos += 1;
            }
            '>' if next == Some('=') => {
                tokens.push(Token::Ge);
                pos += 2;
            }
            '>' => {
                tokens.push(Token::Gt);
                pos += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                pos += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                pos += 2;
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = pos;
                while pos < chars.len()
                    && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '$')
                {
                    pos += 1;
                }
                let ident: String = chars[start..pos].iter().collect();
                if ident == "in" {
                    tokens.push(Token::In);
                } else {
                    tokens.push(Token::Ident(ident));
                }
            }
            _ => {
                return Err(Error::Lex {
                    pos,
                    message: format!("unexpected character {:?}", c),
                })
            }
        }
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(f64, usize), Error> {
    let mut pos = start;
    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < chars.len()
        && chars[pos] == '.'
        && chars
            .get(pos + 1)
            .map(|c| c.is_ascii_digit())
            .unwrap_or(false)
    {
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
        let mut exp_end = pos + 1;
        if exp_end < chars.len() && (chars[exp_end] == '+' || chars[exp_end] == '-') {
            exp_end += 1;
        }
        if exp_end < chars.len() && chars[exp_end].is_ascii_digit() {
            while exp_end < chars.len() && chars[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            pos = exp_end;
        }
    }
    let text: String = chars[start..pos].iter().collect();
    text.parse::<f64>()
        .map(|number| (number, pos))
        .map_err(|e| Error::Lex {
            pos: start,
            message: format!("invalid number {:?}: {}", text, e),
        })
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), Error> {
    let quote = chars[start];
    let mut result = String::new();
    let mut pos = start + 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' if pos + 1 < chars.len() => {
                result.push(chars[pos + 1]);
                pos += 2;
            }
            c if c == quote => return Ok((result, pos + 1)),
            c => {
                result.push(c);
                pos += 1;
            }
        }
    }
    Err(Error::Lex {
        pos: start,
        message: "unterminated string literal".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn tokenize_numeric_comparison() -> Result<(), anyhow::Error> {
        assert_eq!(
            tokenize("arrayMax(variant.INFO.AF) < 0.2")?,
            vec![
                Token::Ident("arrayMax".into()),
                Token::LParen,
                Token::Ident("variant".into()),
                Token::Dot,
                Token::Ident("INFO".into()),
                Token::Dot,
                Token::Ident("AF".into()),
                Token::RParen,
                Token::Lt,
                Token::Number(0.2),
            ]
        );
        Ok(())
    }

    #[test]
    fn tokenize_string_and_leading_dot() -> Result<(), anyhow::Error> {
        assert_eq!(
            tokenize("x.IMPACT == 'HIGH' || y >= .5")?,
            vec![
                Token::Ident("x".into()),
                Token::Dot,
                Token::Ident("IMPACT".into()),
                Token::EqEq,
                Token::Str("HIGH".into()),
                Token::Or,
                Token::Ident("y".into()),
                Token::Ge,
                Token::Number(0.5),
            ]
        );
        Ok(())
    }

    #[test]
    fn tokenize_escapes_and_keywords() -> Result<(), anyhow::Error> {
        assert_eq!(
            tokenize(r#"'it\'s' in a[0] && !b"#)?,
            vec![
                Token::Str("it's".into()),
                Token::In,
                Token::Ident("a".into()),
                Token::LBracket,
                Token::Number(0.0),
                Token::RBracket,
                Token::And,
                Token::Not,
                Token::Ident("b".into()),
            ]
        );
        Ok(())
    }

    #[rstest::rstest]
    #[case::unterminated("'abc")]
    #[case::stray_char("a # b")]
    #[case::single_ampersand("a & b")]
    fn tokenize_errors(#[case] input: &str) {
        assert!(matches!(tokenize(input), Err(Error::Lex { .. })));
    }
}
