//! Formula parser
//!
//! A recursive descent parser with one token of lookahead. Positions are
//! character offsets into the source so errors can point at the offending
//! text.

use crate::ast::{BinaryOperator, CellRef, Expr, ExprKind, RangeRef, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::value::Value;
use gridcalc_core::CellAddress;
use std::fmt;

/// Parse formula source (without a leading `=`) into an AST
///
/// Returns `Ok(None)` when the source is blank.
///
/// # Example
/// ```rust
/// use gridcalc_formula::parse;
///
/// let ast = parse("1+2").unwrap().unwrap();
/// assert_eq!(ast.to_string(), "1+2");
///
/// let ast = parse("sum(a1:a10)").unwrap().unwrap();
/// assert_eq!(ast.to_string(), "SUM(A1:A10)");
///
/// assert!(parse("   ").unwrap().is_none());
/// ```
pub fn parse(source: &str) -> FormulaResult<Option<Expr>> {
    if source.trim().is_empty() {
        return Ok(None);
    }

    let mut parser = FormulaParser::new(source)?;
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if parser.current_token() != &Token::Eof {
        return Err(FormulaError::syntax(
            format!("unexpected {}", parser.current_token()),
            parser.token_pos,
        ));
    }

    Ok(Some(expr))
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),

    // Identifiers and references
    Identifier(String),
    CellRef(CellAddress),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(_) => f.write_str("string"),
            Token::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Token::Identifier(name) => write!(f, "name '{}'", name),
            Token::CellRef(addr) => write!(f, "reference {}", addr),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Equal => f.write_str("'='"),
            Token::NotEqual => f.write_str("'<>'"),
            Token::LessThan => f.write_str("'<'"),
            Token::LessEqual => f.write_str("'<='"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::GreaterEqual => f.write_str("'>='"),
            Token::Colon => f.write_str("':'"),
            Token::Comma => f.write_str("','"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::Eof => f.write_str("end of formula"),
        }
    }
}

/// Formula parser
struct FormulaParser {
    chars: Vec<char>,
    pos: usize,
    current_token: Token,
    /// Character offset of `current_token`
    token_pos: usize,
}

impl FormulaParser {
    fn new(input: &str) -> FormulaResult<Self> {
        let mut parser = Self {
            chars: input.chars().collect(),
            pos: 0,
            current_token: Token::Eof,
            token_pos: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        self.skip_whitespace();
        self.token_pos = self.pos;
        self.current_token = self.scan_token()?;
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '=' => Some(Token::Equal),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::NotEqual);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            }
            return Ok(Token::GreaterThan);
        }

        if c == '"' {
            return self.scan_string();
        }

        if c.is_ascii_digit() || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier_or_ref();
        }

        Err(FormulaError::syntax(
            format!("unexpected character '{}'", c),
            self.pos,
        ))
    }

    fn scan_string(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    // "" is an escaped quote
                    if self.peek_char_at(1) == Some('"') {
                        s.push('"');
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        return Ok(Token::String(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::syntax("unterminated string", start)),
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        self.skip_digits();

        // Decimal part
        if self.peek_char() == Some('.')
            && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit())
        {
            self.advance();
            self.skip_digits();
        }

        // Exponent part, only when digits follow
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let digits_at = if matches!(self.peek_char_at(1), Some('+' | '-')) {
                2
            } else {
                1
            };
            if self.peek_char_at(digits_at).map_or(false, |c| c.is_ascii_digit()) {
                for _ in 0..digits_at {
                    self.advance();
                }
                self.skip_digits();
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Token::Number(n)),
            _ => Err(FormulaError::syntax(
                format!("invalid number '{}'", text),
                start,
            )),
        }
    }

    fn scan_identifier_or_ref(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            self.advance();
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        let followed_by_paren = self.peek_non_whitespace() == Some('(');

        // A name followed by '(' is always a function call (LOG10, TRUE())
        if followed_by_paren {
            return Ok(Token::Identifier(text.to_uppercase()));
        }

        let upper = text.to_uppercase();
        if upper == "TRUE" {
            return Ok(Token::Boolean(true));
        }
        if upper == "FALSE" {
            return Ok(Token::Boolean(false));
        }

        if Self::is_cell_reference(&text) {
            return CellAddress::parse(&text)
                .map(Token::CellRef)
                .map_err(|e| FormulaError::syntax(format!("invalid reference: {}", e), start));
        }

        Ok(Token::Identifier(upper))
    }

    /// `[$]LETTERS[$]DIGITS`
    fn is_cell_reference(text: &str) -> bool {
        let body = text.strip_prefix('$').unwrap_or(text);
        let letters = body.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        if letters == 0 {
            return false;
        }
        let rest = &body[letters..];
        let digits = rest.strip_prefix('$').unwrap_or(rest);
        !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn peek_non_whitespace(&self) -> Option<char> {
        self.chars[self.pos..]
            .iter()
            .copied()
            .find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if self.pos < self.chars.len() {
            self.pos += 1;
        }
    }

    fn skip_digits(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        &self.current_token
    }

    /// Take the current token and its position, moving to the next one
    fn consume(&mut self) -> FormulaResult<(Token, usize)> {
        let token = std::mem::replace(&mut self.current_token, Token::Eof);
        let pos = self.token_pos;
        self.advance_token()?;
        Ok((token, pos))
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::syntax(
                format!("expected {}, found {}", expected, self.current_token()),
                self.token_pos,
            ))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >= (non-associative)
    // 2. Addition/Subtraction: +, -
    // 3. Multiplication/Division: *, /
    // 4. Unary: -
    // 5. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_comparison()
    }

    fn comparison_operator(&self) -> Option<BinaryOperator> {
        match self.current_token() {
            Token::Equal => Some(BinaryOperator::Equal),
            Token::NotEqual => Some(BinaryOperator::NotEqual),
            Token::LessThan => Some(BinaryOperator::LessThan),
            Token::LessEqual => Some(BinaryOperator::LessEqual),
            Token::GreaterThan => Some(BinaryOperator::GreaterThan),
            Token::GreaterEqual => Some(BinaryOperator::GreaterEqual),
            _ => None,
        }
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_additive()?;

        let op = match self.comparison_operator() {
            Some(op) => op,
            None => return Ok(left),
        };

        let (_, position) = self.consume()?;
        let right = self.parse_additive()?;

        if self.comparison_operator().is_some() {
            return Err(FormulaError::syntax(
                "comparison operators cannot be chained",
                self.token_pos,
            ));
        }

        Ok(Expr::new(
            ExprKind::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            position,
        ))
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            let (_, position) = self.consume()?;
            let right = self.parse_multiplicative()?;
            left = Expr::new(
                ExprKind::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                position,
            );
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            let (_, position) = self.consume()?;
            let right = self.parse_unary()?;
            left = Expr::new(
                ExprKind::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                position,
            );
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        if matches!(self.current_token(), Token::Minus) {
            let (_, position) = self.consume()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                },
                position,
            ));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        let (token, position) = self.consume()?;

        match token {
            Token::Number(n) => Ok(Expr::literal(n, position)),

            Token::String(s) => Ok(Expr::literal(Value::Text(s), position)),

            Token::Boolean(b) => Ok(Expr::literal(b, position)),

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::CellRef(address) => self.parse_reference(address, position),

            Token::Identifier(name) => {
                if matches!(self.current_token(), Token::LeftParen) {
                    self.parse_function_call(name, position)
                } else {
                    Err(FormulaError::syntax(
                        format!("unknown name '{}'", name),
                        position,
                    ))
                }
            }

            other => Err(FormulaError::syntax(
                format!("unexpected {}", other),
                position,
            )),
        }
    }

    fn parse_reference(&mut self, start: CellAddress, position: usize) -> FormulaResult<Expr> {
        if !matches!(self.current_token(), Token::Colon) {
            return Ok(Expr::new(ExprKind::CellRef(CellRef::from(start)), position));
        }

        self.consume()?;
        match self.consume()? {
            (Token::CellRef(end), _) => Ok(Expr::new(
                ExprKind::RangeRef(RangeRef {
                    start: CellRef::from(start),
                    end: CellRef::from(end),
                }),
                position,
            )),
            (other, pos) => Err(FormulaError::syntax(
                format!("expected a cell reference after ':', found {}", other),
                pos,
            )),
        }
    }

    fn parse_function_call(&mut self, name: String, position: usize) -> FormulaResult<Expr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume()?;
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(Expr::new(ExprKind::Call { name, args }, position))
    }
}
