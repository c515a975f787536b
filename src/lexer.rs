use crate::error::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Semicolon,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    EqualEqual,
    BangEqual,
    Bang,
    Hash,

    // Literals
    Identifier,
    Number,

    // Keywords
    True,
    False,

    // Special
    Illegal,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }

    /// Human-readable form for diagnostics.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

fn keyword(text: &str) -> Option<TokenType> {
    match text {
        "true" => Some(TokenType::True),
        "false" => Some(TokenType::False),
        _ => None,
    }
}

/// On-demand tokenizer. Positions are character offsets, which is what
/// ariadne expects for labels.
pub struct Lexer {
    source: Vec<char>,
    start: usize,
    current: usize,
    finished: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            finished: false,
        }
    }

    /// Drains the remaining input, `Eof` included.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        self.by_ref().collect()
    }

    /// Produces the next token. Once input is exhausted every call yields `Eof`.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenType::Eof);
        }

        let c = self.advance();
        match c {
            '(' => self.make_token(TokenType::LeftParen),
            ')' => self.make_token(TokenType::RightParen),
            '{' => self.make_token(TokenType::LeftBrace),
            '}' => self.make_token(TokenType::RightBrace),
            ';' => self.make_token(TokenType::Semicolon),
            '+' => self.make_token(TokenType::Plus),
            '-' => self.make_token(TokenType::Minus),
            '*' => self.make_token(TokenType::Star),
            '/' => self.make_token(TokenType::Slash),
            '<' => self.make_token(TokenType::Less),
            '>' => self.make_token(TokenType::Greater),
            '#' => self.make_token(TokenType::Hash),
            '!' => {
                let token_type = if self.match_char('=') {
                    TokenType::BangEqual
                } else {
                    TokenType::Bang
                };
                self.make_token(token_type)
            }
            // A lone '=' has no meaning: there is no assignment.
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Illegal
                };
                self.make_token(token_type)
            }
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() => self.identifier(),
            _ => self.make_token(TokenType::Illegal),
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.current += 1;
        }
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // At most one fractional part; a second '.' starts a new token.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.make_token(TokenType::Number)
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        let token_type = keyword(&text).unwrap_or(TokenType::Identifier);
        Token::new(token_type, text, Span::new(self.start, self.current))
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        let span = if token_type == TokenType::Eof {
            Span::new(self.current, self.current)
        } else {
            Span::new(self.start, self.current)
        };
        Token::new(token_type, self.lexeme(), span)
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields every token up to and including a single `Eof`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.token_type == TokenType::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
