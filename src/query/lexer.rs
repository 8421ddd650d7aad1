/// Query lexer - converts query text into tokens

use super::token::{Token, TokenType};
use crate::error::{Result, SearchError};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let start = self.position;

        if self.is_eof() {
            return Ok(Token::new(TokenType::Eof, String::new(), line, column));
        }

        let ch = self.current_char();

        let token_type = match ch {
            '\'' | '"' => self.read_string(ch)?,
            '0'..='9' => self.read_number(),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            '=' => self.single(TokenType::Eq),
            '*' => self.single(TokenType::Star),
            '(' => self.single(TokenType::LParen),
            ')' => self.single(TokenType::RParen),
            '{' => self.single(TokenType::LBrace),
            '}' => self.single(TokenType::RBrace),
            ':' => self.single(TokenType::Colon),
            ',' => self.single(TokenType::Comma),
            ';' => self.single(TokenType::Semicolon),
            other => self.single(TokenType::Unknown(other)),
        };

        let lexeme: String = self.input[start..self.position].iter().collect();
        Ok(Token::new(token_type, lexeme, line, column))
    }

    fn single(&mut self, token_type: TokenType) -> TokenType {
        self.advance();
        token_type
    }

    fn current_char(&self) -> char {
        if self.is_eof() {
            '\0'
        } else {
            self.input[self.position]
        }
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            if self.input[self.position] == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char) -> Result<TokenType> {
        let (line, column) = (self.line, self.column);
        self.advance(); // skip opening quote
        let mut value = String::new();

        while !self.is_eof() && self.current_char() != quote {
            if self.current_char() == '\\' {
                self.advance();
                if self.is_eof() {
                    break;
                }
                let escaped = match self.current_char() {
                    'n' => '\n',
                    't' => '\t',
                    c => c,
                };
                value.push(escaped);
            } else {
                value.push(self.current_char());
            }
            self.advance();
        }

        if self.is_eof() {
            return Err(SearchError::format(format!(
                "Unterminated string starting at {}:{}",
                line, column
            )));
        }

        self.advance(); // skip closing quote
        Ok(TokenType::String(value))
    }

    /// Digits, optionally followed by letters/dots (kept verbatim so the
    /// parser can reject things like `10abc` or `2.5` as a row limit)
    fn read_number(&mut self) -> TokenType {
        let mut value = String::new();
        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '.' || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        TokenType::Number(value)
    }

    fn read_identifier(&mut self) -> TokenType {
        let mut value = String::new();

        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenType::from_keyword(&value).unwrap_or(TokenType::Identifier(value))
    }
}
