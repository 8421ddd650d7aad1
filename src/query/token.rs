/// Token types shared by the SQL-subset and GraphQL-subset parsers
use phf::phf_map;

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "select" => TokenType::Select,
    "from" => TokenType::From,
    "where" => TokenType::Where,
    "and" => TokenType::And,
    "like" => TokenType::Like,
    "limit" => TokenType::Limit,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords (SQL only, case-insensitive)
    Select,
    From,
    Where,
    And,
    Like,
    Limit,

    // Operators
    Eq,           // =
    Star,         // *

    // Delimiters
    LParen,       // (
    RParen,       // )
    LBrace,       // {
    RBrace,       // }
    Colon,        // :
    Comma,        // ,
    Semicolon,    // ;

    // Literals
    Number(String),
    String(String),
    Identifier(String),

    /// Any character the grammars do not use; parsers decide whether it is fatal
    Unknown(char),

    // Special
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text of the token, quotes included for strings
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, line: usize, column: usize) -> Self {
        Self { token_type, lexeme, line, column }
    }

    /// Bare word text for identifiers and keywords
    pub fn word(&self) -> Option<&str> {
        match self.token_type {
            TokenType::Identifier(ref s) => Some(s.as_str()),
            TokenType::Select
            | TokenType::From
            | TokenType::Where
            | TokenType::And
            | TokenType::Like
            | TokenType::Limit => Some(self.lexeme.as_str()),
            _ => None,
        }
    }

    /// Contents of a string literal delimited by `quote`
    pub fn quoted(&self, quote: char) -> Option<&str> {
        match self.token_type {
            TokenType::String(ref s) if self.lexeme.starts_with(quote) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.token_type, TokenType::Eof)
    }
}

impl TokenType {
    /// Case-insensitive keyword lookup
    pub fn from_keyword(s: &str) -> Option<Self> {
        let lowercase = s.to_lowercase();
        KEYWORDS.get(lowercase.as_str()).cloned()
    }
}

/// Render a token slice back into readable source text
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| !t.is_eof())
        .map(|t| t.lexeme.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
