//! Formula tokenizer.
//!
//! Splits formula text into numbers, strings, identifiers and operators.
//! Anything outside that vocabulary is an error rather than being stripped.

use super::eval::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Amp,
    AndAnd,
    OrOr,
    Bang,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    Colon,
    Comma,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut lexer = Lexer {
        chars: input.char_indices().peekable(),
        input,
    };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    input: &'a str,
}

impl Lexer<'_> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, EvalError> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
        let Some((start, c)) = self.chars.next() else {
            return Ok(None);
        };

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            '&' if self.eat('&') => Token::AndAnd,
            '&' => Token::Amp,
            '|' if self.eat('|') => Token::OrOr,
            '!' if self.eat('=') => Token::NotEqual,
            '!' => Token::Bang,
            '=' => {
                self.eat('=');
                Token::Equal
            }
            '<' if self.eat('=') => Token::LessEqual,
            '<' if self.eat('>') => Token::NotEqual,
            '<' => Token::Less,
            '>' if self.eat('=') => Token::GreaterEqual,
            '>' => Token::Greater,
            '"' => self.string()?,
            c if c.is_ascii_digit() || c == '.' => self.number(start)?,
            c if c.is_ascii_alphabetic() || c == '_' => self.ident(start),
            other => return Err(EvalError::Syntax(format!("unexpected character '{other}'"))),
        };
        Ok(Some(token))
    }

    fn string(&mut self) -> Result<Token, EvalError> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => {
                    // Doubled quote is an escaped quote.
                    if self.eat('"') {
                        s.push('"');
                    } else {
                        return Ok(Token::Str(s));
                    }
                }
                Some((_, c)) => s.push(c),
                None => return Err(EvalError::Syntax("unterminated string".into())),
            }
        }
    }

    fn number(&mut self, start: usize) -> Result<Token, EvalError> {
        let mut end = start + 1;
        while let Some(&(idx, c)) = self.chars.peek() {
            let exponent_sign = matches!(c, '+' | '-')
                && matches!(self.input[..idx].chars().last(), Some('e' | 'E'));
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                self.chars.next();
                end = idx + c.len_utf8();
            } else {
                break;
            }
        }
        let text = &self.input[start..end];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| EvalError::Syntax(format!("invalid number '{text}'")))
    }

    fn ident(&mut self, start: usize) -> Token {
        let mut end = start + 1;
        while let Some(&(idx, c)) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.chars.next();
                end = idx + 1;
            } else {
                break;
            }
        }
        Token::Ident(self.input[start..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_range_call() {
        assert_eq!(
            tokenize("SUM(A1:B2) + 1.5").unwrap(),
            vec![
                Token::Ident("SUM".into()),
                Token::LeftParen,
                Token::Ident("A1".into()),
                Token::Colon,
                Token::Ident("B2".into()),
                Token::RightParen,
                Token::Plus,
                Token::Number(1.5),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparison_operators() {
        assert_eq!(
            tokenize("1 >= 2 <> 3 != 4 == 5 <= 6").unwrap(),
            vec![
                Token::Number(1.0),
                Token::GreaterEqual,
                Token::Number(2.0),
                Token::NotEqual,
                Token::Number(3.0),
                Token::NotEqual,
                Token::Number(4.0),
                Token::Equal,
                Token::Number(5.0),
                Token::LessEqual,
                Token::Number(6.0),
            ]
        );
    }

    #[test]
    fn test_tokenize_string_with_escaped_quote() {
        assert_eq!(
            tokenize(r#""say ""hi""" & x"#).unwrap(),
            vec![
                Token::Str(r#"say "hi""#.into()),
                Token::Amp,
                Token::Ident("x".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_exponent() {
        assert_eq!(
            tokenize("1e3-2").unwrap(),
            vec![Token::Number(1000.0), Token::Minus, Token::Number(2.0)]
        );
        assert_eq!(tokenize("2.5E-1").unwrap(), vec![Token::Number(0.25)]);
    }

    #[test]
    fn test_tokenize_rejects_foreign_characters() {
        assert!(tokenize("alert`x`").is_err());
        assert!(tokenize("1; 2").is_err());
        assert!(tokenize("\"open").is_err());
        assert!(tokenize("1 | 2").is_err());
    }
}
