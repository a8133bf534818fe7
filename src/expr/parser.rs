//! Pratt parser turning tokens into an `Expr` tree.

use serde_json::Value;

use super::{
    lexer::{tokenize, Token},
    Error,
};

/// Binary operators, in the order of their binding power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinaryOp {
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    Ne,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
    #[strum(serialize = "in")]
    In,
}

impl BinaryOp {
    fn from_token(token: &Token) -> Option<Self> {
        Some(match token {
            Token::Or => BinaryOp::Or,
            Token::And => BinaryOp::And,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::Ne,
            Token::Lt => BinaryOp::Lt,
            Token::Le => BinaryOp::Le,
            Token::Gt => BinaryOp::Gt,
            Token::Ge => BinaryOp::Ge,
            Token::In => BinaryOp::In,
            _ => return None,
        })
    }

    /// Left binding power.
    fn binding_power(&self) -> u8 {
        match self {
            BinaryOp::Or => 10,
            BinaryOp::And => 20,
            BinaryOp::Eq | BinaryOp::Ne => 30,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::In => 40,
        }
    }
}

/// Unary prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

const PREFIX_BINDING_POWER: u8 = 50;

/// Maximal nesting depth of an expression tree.
pub const MAX_DEPTH: usize = 256;

/// Expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Parse `input` into an expression tree.
pub fn parse(input: &str) -> Result<Expr, Error> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(Error::Parse("empty expression".to_string()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.expression(0)?;
    if let Some(token) = parser.peek() {
        return Err(Error::Parse(format!("unexpected trailing token {:?}", token)));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Number of tree levels above the node being parsed.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), Error> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(Error::Parse(format!(
                "expected {:?} but found {:?}",
                expected, token
            ))),
            None => Err(Error::Parse(format!(
                "expected {:?} but reached end of input",
                expected
            ))),
        }
    }

    /// Account for one more tree level.
    fn descend(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::Parse(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn expression(&mut self, min_bp: u8) -> Result<Expr, Error> {
        self.descend()?;
        let mut levels = 1;
        let mut lhs = self.prefix()?;
        loop {
            let op = match self.peek().and_then(BinaryOp::from_token) {
                Some(op) => op,
                None => break,
            };
            let bp = op.binding_power();
            if bp <= min_bp {
                break;
            }
            self.next();
            self.descend()?;
            levels += 1;
            let rhs = self.expression(bp)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= levels;
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, Error> {
        let expr = match self.next() {
            Some(Token::Number(n)) => Expr::Literal(number_value(n)),
            Some(Token::Str(s)) => Expr::Literal(Value::String(s)),
            Some(Token::Ident(name)) => match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ if self.peek() == Some(&Token::LParen) => {
                    self.next();
                    Expr::Call(name, self.arguments()?)
                }
                _ => Expr::Ident(name),
            },
            Some(Token::LParen) => {
                let inner = self.expression(0)?;
                self.expect(Token::RParen)?;
                inner
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() != Some(&Token::RBracket) {
                    loop {
                        items.push(self.expression(0)?);
                        if self.peek() == Some(&Token::Comma) {
                            self.next();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(Token::RBracket)?;
                Expr::Call(ARRAY_LITERAL.to_string(), items)
            }
            Some(Token::Not) => Expr::Unary(
                UnaryOp::Not,
                Box::new(self.expression(PREFIX_BINDING_POWER)?),
            ),
            Some(Token::Minus) => Expr::Unary(
                UnaryOp::Neg,
                Box::new(self.expression(PREFIX_BINDING_POWER)?),
            ),
            Some(token) => return Err(Error::Parse(format!("unexpected token {:?}", token))),
            None => return Err(Error::Parse("unexpected end of input".to_string())),
        };
        self.postfix(expr)
    }

    fn postfix(&mut self, mut expr: Expr) -> Result<Expr, Error> {
        let mut levels = 0;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.next();
                    self.descend()?;
                    levels += 1;
                    match self.next() {
                        Some(Token::Ident(name)) => expr = Expr::Member(Box::new(expr), name),
                        Some(Token::In) => expr = Expr::Member(Box::new(expr), "in".to_string()),
                        other => {
                            return Err(Error::Parse(format!(
                                "expected property name after '.' but found {:?}",
                                other
                            )))
                        }
                    }
                }
                Some(Token::LBracket) => {
                    self.next();
                    self.descend()?;
                    levels += 1;
                    let index = self.expression(0)?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                _ => {
                    self.depth -= levels;
                    return Ok(expr);
                }
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.next();
            return Ok(args);
        }
        loop {
            args.push(self.expression(0)?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                other => {
                    return Err(Error::Parse(format!(
                        "expected ',' or ')' in argument list but found {:?}",
                        other
                    )))
                }
            }
        }
    }
}

/// Internal function name used for array literals.
pub(crate) const ARRAY_LITERAL: &str = "$array";

/// Convert a parsed number into a JSON number, keeping integers integral.
pub(crate) fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn path(root: &str, members: &[&str]) -> Expr {
        members.iter().fold(Expr::Ident(root.to_string()), |acc, m| {
            Expr::Member(Box::new(acc), m.to_string())
        })
    }

    #[test]
    fn parse_function_comparison() -> Result<(), anyhow::Error> {
        assert_eq!(
            parse("arrayMax(variant.INFO.AF) < 0.2")?,
            Expr::Binary(
                BinaryOp::Lt,
                Box::new(Expr::Call(
                    "arrayMax".into(),
                    vec![path("variant", &["INFO", "AF"])]
                )),
                Box::new(Expr::Literal(json!(0.2))),
            )
        );
        Ok(())
    }

    #[test]
    fn parse_precedence() -> Result<(), anyhow::Error> {
        // `a || b && c == 1` groups as `a || (b && (c == 1))`
        assert_eq!(
            parse("a || b && c == 1")?,
            Expr::Binary(
                BinaryOp::Or,
                Box::new(Expr::Ident("a".into())),
                Box::new(Expr::Binary(
                    BinaryOp::And,
                    Box::new(Expr::Ident("b".into())),
                    Box::new(Expr::Binary(
                        BinaryOp::Eq,
                        Box::new(Expr::Ident("c".into())),
                        Box::new(Expr::Literal(json!(1))),
                    )),
                )),
            )
        );
        Ok(())
    }

    #[test]
    fn parse_index_and_negation() -> Result<(), anyhow::Error> {
        assert_eq!(
            parse("!(x[1] > -2)")?,
            Expr::Unary(
                UnaryOp::Not,
                Box::new(Expr::Binary(
                    BinaryOp::Gt,
                    Box::new(Expr::Index(
                        Box::new(Expr::Ident("x".into())),
                        Box::new(Expr::Literal(json!(1)))
                    )),
                    Box::new(Expr::Unary(
                        UnaryOp::Neg,
                        Box::new(Expr::Literal(json!(2)))
                    )),
                ))
            )
        );
        Ok(())
    }

    #[rstest::rstest]
    #[case::empty("")]
    #[case::dangling_operator("a <")]
    #[case::unclosed_paren("(a < 1")]
    #[case::trailing("a b")]
    #[case::bad_member("a.1")]
    fn parse_errors(#[case] input: &str) {
        assert!(parse(input).is_err(), "{:?}", input);
    }

    #[rstest::rstest]
    #[case::parens(format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000)))]
    #[case::negation("!".repeat(200_000) + "a")]
    #[case::brackets(format!("{}1{}", "[".repeat(200_000), "]".repeat(200_000)))]
    #[case::or_chain(vec!["a"; 200_000].join(" || "))]
    #[case::member_chain(vec!["a"; 200_000].join("."))]
    fn parse_too_deep(#[case] input: String) {
        assert_eq!(
            parse(&input),
            Err(Error::Parse(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )))
        );
    }

    #[test]
    fn parse_moderate_nesting() -> Result<(), anyhow::Error> {
        let input = format!("{}a{} || b.c.d[0] || e", "(".repeat(64), ")".repeat(64));
        parse(&input)?;
        Ok(())
    }
}
