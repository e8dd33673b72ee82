//! Recursive-descent formula parser.
//!
//! Precedence, lowest to highest:
//! 1. `||`
//! 2. `&&`
//! 3. comparison: `=` `==` `!=` `<>` `<` `<=` `>` `>=`
//! 4. concatenation: `&`
//! 5. `+` `-`
//! 6. `*` `/`
//! 7. unary `-` `+` `!`
//! 8. primary: literals, lists, references, ranges, calls, parentheses

use super::cell_ref::split_ref_token;
use super::eval::EvalError;
use super::token::{Token, tokenize};
use crate::builtins;

/// Parentheses, lists, calls and unary operators may nest this deep.
const MAX_NESTING: usize = 64;
/// Bound on the height of the expression tree, chained binary operators included.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Plus,
    Not,
}

/// One end of a reference: column token plus optional 1-indexed row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RefToken {
    pub column: String,
    pub row: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<Expr>),
    Ref(RefToken),
    Range(RefToken, RefToken),
    Call(String, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

pub(crate) fn parse_formula(formula: &str) -> Result<Expr, EvalError> {
    let body = formula.trim();
    let body = body.strip_prefix('=').unwrap_or(body);
    let tokens = tokenize(body)?;
    if tokens.is_empty() {
        return Err(EvalError::Syntax("empty formula".into()));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
        depth: 0,
    };
    let expr = parser.or()?;
    if let Some(token) = parser.peek() {
        return Err(EvalError::Syntax(format!("unexpected token {token:?}")));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    nesting: usize,
    depth: usize,
}

fn too_deep() -> EvalError {
    EvalError::Syntax("formula nested too deeply".into())
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), EvalError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(EvalError::Syntax(format!(
                "expected {expected:?}, got {:?}",
                self.peek()
            )))
        }
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        if self.nesting >= MAX_NESTING || self.depth >= MAX_DEPTH {
            return Err(too_deep());
        }
        self.nesting += 1;
        self.depth += 1;
        let result = parse(self);
        self.nesting -= 1;
        self.depth -= 1;
        result
    }

    fn binary_loop(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, EvalError>,
        op_for: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, EvalError> {
        let start = self.depth;
        let mut left = next(self)?;
        while let Some(op) = self.peek().and_then(op_for) {
            self.pos += 1;
            // Chains fold to the left, so each operator adds a level.
            self.depth += 1;
            if self.depth > MAX_DEPTH {
                return Err(too_deep());
            }
            let right = next(self)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = start;
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr, EvalError> {
        self.binary_loop(Self::and, |t| (t == &Token::OrOr).then_some(BinaryOp::Or))
    }

    fn and(&mut self) -> Result<Expr, EvalError> {
        self.binary_loop(Self::comparison, |t| {
            (t == &Token::AndAnd).then_some(BinaryOp::And)
        })
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        self.binary_loop(Self::concat, |t| match t {
            Token::Equal => Some(BinaryOp::Eq),
            Token::NotEqual => Some(BinaryOp::Ne),
            Token::Less => Some(BinaryOp::Lt),
            Token::LessEqual => Some(BinaryOp::Le),
            Token::Greater => Some(BinaryOp::Gt),
            Token::GreaterEqual => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn concat(&mut self) -> Result<Expr, EvalError> {
        self.binary_loop(Self::additive, |t| {
            (t == &Token::Amp).then_some(BinaryOp::Concat)
        })
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        self.binary_loop(Self::multiplicative, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        self.binary_loop(Self::unary, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.primary(),
        };
        self.pos += 1;
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Text(s)),
            Some(Token::LeftParen) => self.nested(|p| {
                let inner = p.or()?;
                p.expect(&Token::RightParen)?;
                Ok(inner)
            }),
            Some(Token::LeftBracket) => {
                let items = self.nested(|p| p.arguments(&Token::RightBracket))?;
                Ok(Expr::List(items))
            }
            Some(Token::Ident(name)) => self.identifier(name),
            other => Err(EvalError::Syntax(format!("unexpected token {other:?}"))),
        }
    }

    fn identifier(&mut self, name: String) -> Result<Expr, EvalError> {
        // Anything followed by '(' is a call, so `LOG10(` never reads as a cell.
        if self.eat(&Token::LeftParen) {
            if !builtins::is_builtin(&name) {
                return Err(EvalError::UnknownFunction(name));
            }
            let args = self.nested(|p| p.arguments(&Token::RightParen))?;
            return Ok(Expr::Call(name.to_ascii_uppercase(), args));
        }

        let start = ref_token(&name);
        if self.peek() == Some(&Token::Colon) {
            if let Some(Token::Ident(end_name)) = self.peek_at(1).cloned() {
                let end = ref_token(&end_name);
                if let (Some(start), Some(end)) = (start, end) {
                    if start.row.is_some() == end.row.is_some() {
                        self.pos += 2;
                        return Ok(Expr::Range(start, end));
                    }
                }
            }
            return Err(EvalError::Syntax(format!("malformed range after '{name}'")));
        }

        if name.eq_ignore_ascii_case("true") {
            return Ok(Expr::Bool(true));
        }
        if name.eq_ignore_ascii_case("false") {
            return Ok(Expr::Bool(false));
        }
        match start {
            Some(r) if r.row.is_some() => Ok(Expr::Ref(r)),
            _ => Err(EvalError::UnknownIdentifier(name)),
        }
    }

    fn arguments(&mut self, close: &Token) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Ok(args);
        }
        loop {
            args.push(self.or()?);
            if self.eat(close) {
                return Ok(args);
            }
            self.expect(&Token::Comma)?;
        }
    }
}

/// `B12` -> column "B", row 12; `B` -> column "B", no row.
fn ref_token(name: &str) -> Option<RefToken> {
    if let Some((column, row)) = split_ref_token(name) {
        return Some(RefToken {
            column: column.to_string(),
            row: Some(row),
        });
    }
    name.chars().all(|c| c.is_ascii_alphabetic()).then(|| RefToken {
        column: name.to_string(),
        row: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(column: &str, row: usize) -> RefToken {
        RefToken {
            column: column.into(),
            row: Some(row),
        }
    }

    #[test]
    fn test_precedence() {
        let expr = parse_formula("=1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Number(1.0)),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Number(2.0)),
                    Box::new(Expr::Number(3.0))
                ))
            )
        );
    }

    #[test]
    fn test_nested_calls_compose() {
        let expr = parse_formula("SUM(A1:A2) + MAX(B1:B2)").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Call(
                    "SUM".into(),
                    vec![Expr::Range(r("A", 1), r("A", 2))]
                )),
                Box::new(Expr::Call(
                    "MAX".into(),
                    vec![Expr::Range(r("B", 1), r("B", 2))]
                )),
            )
        );
    }

    #[test]
    fn test_column_range() {
        let expr = parse_formula("=sum(B:B)").unwrap();
        let col = |c: &str| RefToken {
            column: c.into(),
            row: None,
        };
        assert_eq!(
            expr,
            Expr::Call("SUM".into(), vec![Expr::Range(col("B"), col("B"))])
        );
    }

    #[test]
    fn test_header_composite_reference() {
        assert_eq!(parse_formula("Price2").unwrap(), Expr::Ref(r("Price", 2)));
    }

    #[test]
    fn test_booleans_and_lists() {
        assert_eq!(
            parse_formula("[1, TRUE]").unwrap(),
            Expr::List(vec![Expr::Number(1.0), Expr::Bool(true)])
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_formula("=").is_err());
        assert!(parse_formula("=1 +").is_err());
        assert!(parse_formula("=A1:B").is_err());
        assert!(parse_formula("=(1").is_err());
        assert!(matches!(
            parse_formula("=foo"),
            Err(EvalError::UnknownIdentifier(_))
        ));
        assert!(matches!(
            parse_formula("=VLOOKUP(1)"),
            Err(EvalError::UnknownFunction(_))
        ));
    }

    fn wrapped(open: &str, close: &str, depth: usize) -> String {
        format!("={}1{}", open.repeat(depth), close.repeat(depth))
    }

    #[test]
    fn test_nesting_within_limit() {
        assert_eq!(parse_formula(&wrapped("(", ")", 40)).unwrap(), Expr::Number(1.0));
        assert!(parse_formula(&wrapped("ABS(", ")", 40)).is_ok());
        assert!(parse_formula(&wrapped("[", "]", 40)).is_ok());
        assert!(parse_formula(&format!("={}1", "-".repeat(40))).is_ok());

        let long_sum = format!("=1{}", "+1".repeat(200));
        assert!(parse_formula(&long_sum).is_ok());
    }

    #[test]
    fn test_nesting_too_deep_is_syntax_error() {
        for formula in [
            wrapped("(", ")", 10_000),
            wrapped("ABS(", ")", 10_000),
            wrapped("[", "]", 10_000),
            format!("={}1", "-".repeat(10_000)),
            format!("={}TRUE", "!".repeat(10_000)),
            format!("=1{}", "*2".repeat(10_000)),
        ] {
            assert!(matches!(parse_formula(&formula), Err(EvalError::Syntax(_))));
        }
    }

    #[test]
    fn test_nesting_limit_is_per_path() {
        // Siblings do not accumulate depth.
        let siblings = vec![wrapped("(", ")", 30).trim_start_matches('=').to_string(); 50];
        let formula = format!("=SUM({})", siblings.join(", "));
        assert!(parse_formula(&formula).is_ok());
    }
}
