use crate::ast::{Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::error::{BandmathError, BandmathResult, Span};
use crate::lexer::{Lexer, Token, TokenType};

/// Binding power, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Mask,
    Sum,
    Product,
    Prefix,
}

impl Precedence {
    fn of(token_type: TokenType) -> Self {
        match token_type {
            TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
            TokenType::Less | TokenType::Greater => Precedence::LessGreater,
            TokenType::Hash => Precedence::Mask,
            TokenType::Plus | TokenType::Minus => Precedence::Sum,
            TokenType::Star | TokenType::Slash => Precedence::Product,
            _ => Precedence::Lowest,
        }
    }
}

fn infix_operator(token_type: TokenType) -> Option<InfixOp> {
    match token_type {
        TokenType::Plus => Some(InfixOp::Add),
        TokenType::Minus => Some(InfixOp::Subtract),
        TokenType::Star => Some(InfixOp::Multiply),
        TokenType::Slash => Some(InfixOp::Divide),
        TokenType::Less => Some(InfixOp::Less),
        TokenType::Greater => Some(InfixOp::Greater),
        TokenType::EqualEqual => Some(InfixOp::Equal),
        TokenType::BangEqual => Some(InfixOp::NotEqual),
        TokenType::Hash => Some(InfixOp::Mask),
        _ => None,
    }
}

/// Pratt parser. Errors are collected instead of aborting the parse: after a
/// failure the parser skips past the next `;` and carries on.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<BandmathError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens;
        if tokens.last().map(|t| t.token_type) != Some(TokenType::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token::new(TokenType::Eof, String::new(), Span::new(end, end)));
        }
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source).scan_tokens())
    }

    /// Parses every statement it can. Check [`Parser::errors`] afterwards.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.statement() {
                Ok(statement) => statements.push(statement),
                Err(error) => {
                    tracing::debug!(message = %error, "syntax error, resynchronizing");
                    self.errors.push(error);
                    self.synchronize();
                }
            }
        }

        Program { statements }
    }

    /// Convenience wrapper: the program, or every syntax error found.
    pub fn parse(mut self) -> Result<Program, Vec<BandmathError>> {
        let program = self.parse_program();
        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(self.errors)
        }
    }

    pub fn errors(&self) -> &[BandmathError] {
        &self.errors
    }

    fn statement(&mut self) -> BandmathResult<Stmt> {
        if self.check(TokenType::LeftBrace) {
            self.block()
        } else {
            self.expression_statement()
        }
    }

    fn block(&mut self) -> BandmathResult<Stmt> {
        let start = self.advance().span.start;
        let mut statements = Vec::new();

        while !self.check(TokenType::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        let end = self
            .consume_with_help(
                TokenType::RightBrace,
                "Expected '}' after block",
                "Block statements must be closed with '}' after the opening '{'.",
            )?
            .span
            .end;

        Ok(Stmt::Block {
            statements,
            span: Span::new(start, end),
        })
    }

    fn expression_statement(&mut self) -> BandmathResult<Stmt> {
        let start = self.peek().span.start;
        let expr = self.expression(Precedence::Lowest)?;

        // The terminator is optional.
        if self.check(TokenType::Semicolon) {
            self.advance();
        }

        let end = self.previous().span.end;
        Ok(Stmt::Expression {
            expr,
            span: Span::new(start, end),
        })
    }

    fn expression(&mut self, precedence: Precedence) -> BandmathResult<Expr> {
        let mut left = self.prefix()?;

        while precedence < Precedence::of(self.peek().token_type) {
            let operator_token = self.advance().clone();
            left = self.infix(left, &operator_token)?;
        }

        Ok(left)
    }

    fn prefix(&mut self) -> BandmathResult<Expr> {
        // Eof is never consumed, so it is inspected in place.
        let token = if self.is_at_end() {
            self.peek().clone()
        } else {
            self.advance().clone()
        };

        match token.token_type {
            TokenType::Number => {
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    BandmathError::syntax(
                        token.span.clone(),
                        format!("Invalid number literal '{}'", token.lexeme),
                    )
                })?;
                Ok(Expr::Number {
                    value,
                    span: token.span,
                })
            }
            TokenType::True => Ok(Expr::Boolean {
                value: true,
                span: token.span,
            }),
            TokenType::False => Ok(Expr::Boolean {
                value: false,
                span: token.span,
            }),
            TokenType::Identifier => Ok(Expr::Identifier {
                name: token.lexeme,
                span: token.span,
            }),
            TokenType::Bang | TokenType::Minus => {
                let operator = if token.token_type == TokenType::Bang {
                    PrefixOp::Not
                } else {
                    PrefixOp::Negate
                };
                self.expect_operand(&token)?;
                let operand = self.expression(Precedence::Prefix)?;
                let span = token.span.to(operand.span());
                Ok(Expr::Prefix {
                    operator,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenType::LeftParen => self.grouped(token),
            TokenType::Illegal => Err(BandmathError::syntax_with_help(
                token.span,
                format!("Illegal character '{}'", token.lexeme),
                "Expressions are built from band names, numbers, true/false, parentheses and the operators + - * / < > == != ! #.",
            )),
            _ => {
                let help = match token.token_type {
                    TokenType::RightParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
                    TokenType::RightBrace => "Found '}' without matching '{'. Check for unbalanced braces.",
                    TokenType::Eof => "Reached end of input while expecting an expression.",
                    _ => "Expected a band name, number, boolean, or parenthesized expression here.",
                };
                Err(BandmathError::syntax_with_help(
                    token.span.clone(),
                    format!("Expected expression, found {}", token.describe()),
                    help,
                ))
            }
        }
    }

    fn grouped(&mut self, open: Token) -> BandmathResult<Expr> {
        if self.check(TokenType::RightParen) {
            return Err(BandmathError::syntax_with_help(
                Span::new(open.span.start, self.peek().span.end),
                "Empty parentheses are not allowed",
                "Parentheses must contain an expression. Example: (B5 + B4)",
            ));
        }

        let expr = self.expression(Precedence::Lowest)?;
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after expression",
            "Every opening parenthesis '(' must have a matching closing parenthesis ')'.",
        )?;
        Ok(expr)
    }

    fn infix(&mut self, left: Expr, operator_token: &Token) -> BandmathResult<Expr> {
        let Some(operator) = infix_operator(operator_token.token_type) else {
            return Err(BandmathError::syntax(
                operator_token.span.clone(),
                format!("{} is not an infix operator", operator_token.describe()),
            ));
        };

        self.expect_operand(operator_token)?;
        let right = self.expression(Precedence::of(operator_token.token_type))?;
        let span = left.span().to(right.span());

        Ok(Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        })
    }

    /// Reports a missing operand at the token that was found instead.
    fn expect_operand(&self, operator_token: &Token) -> BandmathResult<()> {
        let next = self.peek();
        let starts_expression = matches!(
            next.token_type,
            TokenType::Number
                | TokenType::Identifier
                | TokenType::True
                | TokenType::False
                | TokenType::Bang
                | TokenType::Minus
                | TokenType::LeftParen
        );
        if starts_expression {
            return Ok(());
        }

        Err(BandmathError::syntax_with_help(
            next.span.clone(),
            format!(
                "Expected expression after '{}', found {}",
                operator_token.lexeme,
                next.describe()
            ),
            format!(
                "The operator '{}' needs an operand to its right.",
                operator_token.lexeme
            ),
        ))
    }

    /// Skips to just past the next `;` (or to the end of input).
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.advance().token_type == TokenType::Semicolon {
                return;
            }
        }
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: &str,
    ) -> BandmathResult<&Token> {
        if self.check(token_type) {
            return Ok(self.advance());
        }

        let found = self.peek();
        let span = if self.is_at_end() && self.current > 0 {
            // Point just past the last real token.
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            found.span.clone()
        };

        Err(BandmathError::syntax_with_help(
            span,
            format!("{}, found {}", message, found.describe()),
            help,
        ))
    }
}
