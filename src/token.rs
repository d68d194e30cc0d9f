use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, strum_macros::Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    #[strum(to_string = "ILLEGAL")]
    Illegal,
    #[strum(to_string = "EOF")]
    Eof,

    // Identifiers and literals
    #[strum(to_string = "IDENT")]
    Ident,
    #[strum(to_string = "INT")]
    Int,

    // Operators
    #[strum(to_string = "=")]
    Assign,
    #[strum(to_string = "+")]
    Plus,
    #[strum(to_string = "-")]
    Minus,
    #[strum(to_string = "!")]
    Bang,
    #[strum(to_string = "*")]
    Asterisk,
    #[strum(to_string = "/")]
    Slash,
    #[strum(to_string = "<")]
    LT,
    #[strum(to_string = ">")]
    GT,
    #[strum(to_string = "==")]
    Eq,
    #[strum(to_string = "!=")]
    NotEq,

    // Delimiters
    #[strum(to_string = ",")]
    Comma,
    #[strum(to_string = ";")]
    Semicolon,

    #[strum(to_string = "(")]
    LParen,
    #[strum(to_string = ")")]
    RParen,
    #[strum(to_string = "{")]
    LBrace,
    #[strum(to_string = "}")]
    RBrace,

    // Keywords
    #[strum(to_string = "FUNCTION")]
    Function,
    #[strum(to_string = "LET")]
    Let,
    #[strum(to_string = "TRUE")]
    True,
    #[strum(to_string = "FALSE")]
    False,
    #[strum(to_string = "IF")]
    If,
    #[strum(to_string = "ELSE")]
    Else,
    #[strum(to_string = "RETURN")]
    Return,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenType> = vec![
        ("fn", TokenType::Function),
        ("let", TokenType::Let),
        ("true", TokenType::True),
        ("false", TokenType::False),
        ("if", TokenType::If),
        ("else", TokenType::Else),
        ("return", TokenType::Return),
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
}

impl Token {
    /// Classifies a scanned word as a keyword or an identifier.
    pub fn new(word: &str) -> Self {
        let token_type = KEYWORDS.get(word).copied().unwrap_or(TokenType::Ident);
        Self {
            token_type,
            literal: word.to_owned(),
        }
    }

    pub fn new_from_char(token_type: TokenType, ch: u8) -> Self {
        Self {
            token_type,
            literal: (ch as char).to_string(),
        }
    }

    pub fn eof() -> Self {
        Self {
            token_type: TokenType::Eof,
            literal: "".to_owned(),
        }
    }

    pub fn is(&self, token_type: TokenType) -> bool {
        self.token_type == token_type
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{{Type:{} Literal:{}}}", self.token_type, self.literal)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Token::new("fn").token_type, TokenType::Function);
        assert_eq!(Token::new("let").token_type, TokenType::Let);
        assert_eq!(Token::new("return").token_type, TokenType::Return);
        assert_eq!(Token::new("lettuce").token_type, TokenType::Ident);
        assert_eq!(Token::new("lettuce").literal, "lettuce");
    }

    #[test]
    fn test_display() {
        assert_eq!(Token::new("let").to_string(), "{Type:LET Literal:let}");
        assert_eq!(
            Token::new_from_char(TokenType::Assign, b'=').to_string(),
            "{Type:= Literal:=}"
        );
        assert_eq!(Token::eof().to_string(), "{Type:EOF Literal:}");
    }
}
