use super::ast::{BinaryOp, Expr, Func, UnaryOp};
use super::lexer::{self, LexError, Spanned, Token};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at offset {offset}")]
    UnexpectedToken { offset: usize },

    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    WrongArity {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("the time variable 't' is not available in static models")]
    TimeNotAllowed,
}

/// Parses an expression string into a compiled [`Expr`].
///
/// `resolve` maps a symbol name to its index in the model's symbol table;
/// unknown names are rejected. `allow_time` gates the reserved identifier `t`
/// (dynamic models only).
pub fn parse(
    src: &str,
    resolve: &dyn Fn(&str) -> Option<usize>,
    allow_time: bool,
) -> Result<Expr, ExprError> {
    let tokens = lexer::tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        resolve,
        allow_time,
    };
    let expr = parser.parse_expr(0)?;
    match parser.peek() {
        None => Ok(expr),
        Some((offset, _)) => Err(ExprError::UnexpectedToken { offset: *offset }),
    }
}

// Binding powers: a Pratt parser with conventional precedence.
// Additive (1,2) < multiplicative (3,4) < unary minus (5) < power (6,5).
// Power is right-associative, so -x^2 parses as -(x^2).
const BP_ADDITIVE: (u8, u8) = (1, 2);
const BP_MULTIPLICATIVE: (u8, u8) = (3, 4);
const BP_UNARY: u8 = 5;
const BP_POWER: (u8, u8) = (6, 5);

struct Parser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    resolve: &'a dyn Fn(&str) -> Option<usize>,
    allow_time: bool,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExprError> {
        match self.advance() {
            Some((_, token)) if token == *expected => Ok(()),
            Some((offset, _)) => Err(ExprError::UnexpectedToken { offset }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_prefix()?;

        while let Some((_, token)) = self.peek() {
            let (op, (l_bp, r_bp)) = match token {
                Token::Plus => (BinaryOp::Add, BP_ADDITIVE),
                Token::Minus => (BinaryOp::Sub, BP_ADDITIVE),
                Token::Star => (BinaryOp::Mul, BP_MULTIPLICATIVE),
                Token::Slash => (BinaryOp::Div, BP_MULTIPLICATIVE),
                Token::Caret => (BinaryOp::Pow, BP_POWER),
                _ => break,
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ExprError> {
        match self.advance() {
            None => Err(ExprError::UnexpectedEnd),
            Some((_, Token::Number(value))) => Ok(Expr::Number(value)),
            Some((_, Token::Minus)) => {
                let operand = self.parse_expr(BP_UNARY)?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)))
            }
            Some((_, Token::LParen)) => {
                let inner = self.parse_expr(0)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some((_, Token::Ident(name))) => self.parse_ident(name),
            Some((offset, _)) => Err(ExprError::UnexpectedToken { offset }),
        }
    }

    fn parse_ident(&mut self, name: String) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some((_, Token::LParen))) {
            let func =
                Func::from_name(&name).ok_or_else(|| ExprError::UnknownFunction { name })?;
            self.advance();
            let args = self.parse_args()?;
            if args.len() != func.arity() {
                return Err(ExprError::WrongArity {
                    name: func.name(),
                    expected: func.arity(),
                    found: args.len(),
                });
            }
            return Ok(Expr::Call(func, args));
        }

        match name.as_str() {
            "t" => {
                if self.allow_time {
                    Ok(Expr::Time)
                } else {
                    Err(ExprError::TimeNotAllowed)
                }
            }
            "pi" => Ok(Expr::Number(std::f64::consts::PI)),
            "e" => Ok(Expr::Number(std::f64::consts::E)),
            _ => (self.resolve)(&name)
                .map(Expr::Symbol)
                .ok_or(ExprError::UnknownIdentifier { name }),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some((_, Token::RParen))) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(0)?);
            match self.advance() {
                Some((_, Token::Comma)) => continue,
                Some((_, Token::RParen)) => return Ok(args),
                Some((offset, _)) => return Err(ExprError::UnexpectedToken { offset }),
                None => return Err(ExprError::UnexpectedEnd),
            }
        }
    }
}
