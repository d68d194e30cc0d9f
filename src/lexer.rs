use crate::token::{Token, TokenType};

pub struct Lexer {
    input: String,
    position: usize,
    read_position: usize,
    ch: u8,
    finished: bool,
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

/// Yields every token up to and including the first `EOF`.
impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = token.is(TokenType::Eof);
        Some(token)
    }
}

impl Lexer {
    pub fn new(input: String) -> Self {
        let mut lexer = Self {
            input,
            position: 0,
            read_position: 0,
            ch: 0,
            finished: false,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        self.ch = *self.input.as_bytes().get(self.read_position).unwrap_or(&0);
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        *self.input.as_bytes().get(self.read_position).unwrap_or(&0)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let token = match self.ch {
            b'=' => self.two_char_token(b'=', TokenType::Eq, TokenType::Assign),
            b'!' => self.two_char_token(b'=', TokenType::NotEq, TokenType::Bang),
            b'+' => Token::new_from_char(TokenType::Plus, self.ch),
            b'-' => Token::new_from_char(TokenType::Minus, self.ch),
            b'*' => Token::new_from_char(TokenType::Asterisk, self.ch),
            b'/' => Token::new_from_char(TokenType::Slash, self.ch),
            b'<' => Token::new_from_char(TokenType::LT, self.ch),
            b'>' => Token::new_from_char(TokenType::GT, self.ch),
            b';' => Token::new_from_char(TokenType::Semicolon, self.ch),
            b'(' => Token::new_from_char(TokenType::LParen, self.ch),
            b')' => Token::new_from_char(TokenType::RParen, self.ch),
            b',' => Token::new_from_char(TokenType::Comma, self.ch),
            b'{' => Token::new_from_char(TokenType::LBrace, self.ch),
            b'}' => Token::new_from_char(TokenType::RBrace, self.ch),
            0 => return Token::eof(),
            c => {
                if is_letter(c) {
                    return Token::new(self.read_identifier());
                } else if c.is_ascii_digit() {
                    return Token {
                        token_type: TokenType::Int,
                        literal: self.read_number().to_owned(),
                    };
                } else {
                    self.read_illegal()
                }
            }
        };
        self.read_char();
        token
    }

    fn two_char_token(&mut self, second: u8, double: TokenType, single: TokenType) -> Token {
        if self.peek_char() == second {
            let start = self.position;
            self.read_char();
            Token {
                token_type: double,
                literal: self.input[start..=self.position].to_owned(),
            }
        } else {
            Token::new_from_char(single, self.ch)
        }
    }

    // Takes the whole character, so non-ASCII input yields one ILLEGAL token per
    // character rather than one per byte.
    fn read_illegal(&mut self) -> Token {
        let ch = self
            .input
            .get(self.position..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        for _ in 1..ch.len_utf8() {
            self.read_char();
        }
        Token {
            token_type: TokenType::Illegal,
            literal: ch.to_string(),
        }
    }

    fn read_identifier(&mut self) -> &str {
        let start = self.position;
        while is_letter(self.ch) {
            self.read_char()
        }
        &self.input[start..self.position]
    }

    fn read_number(&mut self) -> &str {
        let start = self.position;
        while self.ch.is_ascii_digit() {
            self.read_char()
        }
        &self.input[start..self.position]
    }

    fn skip_whitespace(&mut self) {
        while self.ch.is_ascii_whitespace() {
            self.read_char();
        }
    }
}
