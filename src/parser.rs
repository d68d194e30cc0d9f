use crate::ast::{self, Expression, Statement};
use crate::lexer::Lexer;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use custom_error::custom_error;
use tracing::debug;

custom_error! {
    #[derive(Clone, PartialEq)]
    pub ParseError

    UnexpectedToken{expected: TokenType, got: TokenType} = "expected next token to be {expected}, got {got} instead",
    NoPrefixParse{token_type: TokenType} = "no prefix parse function for {token_type} found",
    NoInfixParse{token_type: TokenType} = "no infix parse function for {token_type} found",
    InvalidInteger{literal: String} = "could not parse {literal} as integer",
}

type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl From<TokenType> for Precedence {
    fn from(token_type: TokenType) -> Self {
        match token_type {
            TokenType::Eq | TokenType::NotEq => Self::Equals,
            TokenType::LT | TokenType::GT => Self::LessGreater,
            TokenType::Plus | TokenType::Minus => Self::Sum,
            TokenType::Asterisk | TokenType::Slash => Self::Product,
            TokenType::LParen => Self::Call,
            _ => Self::Lowest,
        }
    }
}

pub struct Parser {
    lexer: Lexer,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
    // Blocks entered but not yet closed; left as-is when an error unwinds a block.
    brace_depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur_token = lexer.next_token();
        let peek_token = lexer.next_token();

        Self {
            lexer,
            cur_token,
            peek_token,
            errors: vec![],
            brace_depth: 0,
        }
    }

    fn next_token(&mut self) {
        self.cur_token = std::mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    /// Parses the whole input, reporting every error found rather than only the first.
    pub fn parse_program(mut self) -> std::result::Result<ast::Program, Vec<ParseError>> {
        let mut program = ast::Program::default();

        while !self.cur_token.is(TokenType::Eof) {
            match self.parse_statement() {
                Ok(stmt) => program.statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
            self.next_token();
        }

        if self.errors.is_empty() {
            Ok(program)
        } else {
            debug!(count = self.errors.len(), "parse failed");
            Err(self.errors)
        }
    }

    /// Skips the rest of a failed statement, including whatever is left of the
    /// blocks the error happened inside of.
    fn synchronize(&mut self) {
        loop {
            match self.cur_token.token_type {
                TokenType::Eof => break,
                TokenType::Semicolon if self.brace_depth == 0 => break,
                TokenType::LBrace => self.brace_depth += 1,
                TokenType::RBrace => {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    if self.brace_depth == 0 {
                        self.skip_semicolon();
                        break;
                    }
                }
                _ => {}
            }
            self.next_token();
        }
        self.brace_depth = 0;
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.cur_token.token_type {
            TokenType::Let => self.parse_let_statement().map(Statement::Let),
            TokenType::Return => self.parse_return_statement().map(Statement::Return),
            _ => self.parse_expression_statement().map(Statement::Expr),
        }
    }

    fn parse_let_statement(&mut self) -> Result<ast::LetStatement> {
        let token = self.cur_token.clone();

        self.expect_peek(TokenType::Ident)?;
        let name: ast::Identifier = self.cur_token.clone().into();
        self.expect_peek(TokenType::Assign)?;

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Ok(ast::LetStatement { token, name, value })
    }

    fn parse_return_statement(&mut self) -> Result<ast::ReturnStatement> {
        let token = self.cur_token.clone();

        if [TokenType::Semicolon, TokenType::RBrace, TokenType::Eof]
            .iter()
            .any(|end| self.peek_token.is(*end))
        {
            self.skip_semicolon();
            return Ok(ast::ReturnStatement {
                token,
                return_value: None,
            });
        }

        self.next_token();
        let return_value = Some(self.parse_expression(Precedence::Lowest)?);
        self.skip_semicolon();

        Ok(ast::ReturnStatement {
            token,
            return_value,
        })
    }

    fn parse_expression_statement(&mut self) -> Result<ast::ExpressionStatement> {
        let token = self.cur_token.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Ok(ast::ExpressionStatement { token, expression })
    }

    fn parse_block_statement(&mut self) -> Result<ast::BlockStatement> {
        let token = self.cur_token.clone();
        let mut statements = vec![];

        self.brace_depth += 1;
        self.next_token();
        while !self.cur_token.is(TokenType::RBrace) {
            if self.cur_token.is(TokenType::Eof) {
                return Err(ParseError::UnexpectedToken {
                    expected: TokenType::RBrace,
                    got: TokenType::Eof,
                });
            }
            statements.push(self.parse_statement()?);
            self.next_token();
        }
        self.brace_depth -= 1;

        Ok(ast::BlockStatement { token, statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Result<Expression> {
        ensure_sufficient_stack(|| {
            let mut left = self.parse_prefix()?;

            while !self.peek_token.is(TokenType::Semicolon)
                && precedence < Precedence::from(self.peek_token.token_type)
            {
                self.next_token();
                left = self.parse_infix(left)?;
            }

            Ok(left)
        })
    }

    fn parse_prefix(&mut self) -> Result<Expression> {
        let token = self.cur_token.clone();
        let token_type = token.token_type;
        match token_type {
            TokenType::Ident => Ok(Expression::Identifier(token.into())),
            TokenType::Int => {
                let value = token
                    .literal
                    .parse::<i64>()
                    .map_err(|_| ParseError::InvalidInteger {
                        literal: token.literal.clone(),
                    })?;
                Ok(Expression::IntegerLiteral(ast::IntegerLiteral { token, value }))
            }
            TokenType::True | TokenType::False => {
                let value = token.is(TokenType::True);
                Ok(Expression::Boolean(ast::Boolean { token, value }))
            }
            TokenType::Bang | TokenType::Minus => {
                let operator = self.operator()?;
                self.next_token();
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expression::Prefix(ast::PrefixExpression {
                    token,
                    operator,
                    right: Box::new(right),
                }))
            }
            TokenType::LParen => {
                self.next_token();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_peek(TokenType::RParen)?;
                Ok(expr)
            }
            TokenType::If => self.parse_if_expression().map(Expression::If),
            TokenType::Function => self.parse_function_literal().map(Expression::Function),
            token_type => Err(ParseError::NoPrefixParse { token_type }),
        }
    }

    fn parse_infix(&mut self, left: Expression) -> Result<Expression> {
        let token = self.cur_token.clone();
        if token.is(TokenType::LParen) {
            let arguments = self.parse_call_arguments()?;
            return Ok(Expression::Call(ast::CallExpression {
                token,
                function: Box::new(left),
                arguments,
            }));
        }

        let operator = self.operator()?;
        let precedence = Precedence::from(token.token_type);
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Ok(Expression::Infix(ast::InfixExpression {
            token,
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn operator(&self) -> Result<ast::Operator> {
        let token_type = self.cur_token.token_type;
        ast::Operator::from_token_type(token_type).ok_or(ParseError::NoInfixParse { token_type })
    }

    fn parse_if_expression(&mut self) -> Result<ast::IfExpression> {
        let token = self.cur_token.clone();

        self.expect_peek(TokenType::LParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RParen)?;

        self.expect_peek(TokenType::LBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token.is(TokenType::Else) {
            self.next_token();
            self.expect_peek(TokenType::LBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(ast::IfExpression {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> Result<ast::FunctionLiteral> {
        let token = self.cur_token.clone();

        self.expect_peek(TokenType::LParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(TokenType::LBrace)?;
        let body = self.parse_block_statement()?;

        Ok(ast::FunctionLiteral {
            token,
            parameters,
            body,
        })
    }

    fn parse_function_parameters(&mut self) -> Result<Vec<ast::Identifier>> {
        let mut identifiers = vec![];

        if self.peek_token.is(TokenType::RParen) {
            self.next_token();
            return Ok(identifiers);
        }

        self.expect_peek(TokenType::Ident)?;
        identifiers.push(self.cur_token.clone().into());

        while self.peek_token.is(TokenType::Comma) {
            self.next_token();
            self.expect_peek(TokenType::Ident)?;
            identifiers.push(self.cur_token.clone().into());
        }

        self.expect_peek(TokenType::RParen)?;
        Ok(identifiers)
    }

    fn parse_call_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut args = vec![];

        if self.peek_token.is(TokenType::RParen) {
            self.next_token();
            return Ok(args);
        }

        self.next_token();
        args.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            args.push(self.parse_expression(Precedence::Lowest)?);
        }

        self.expect_peek(TokenType::RParen)?;
        Ok(args)
    }

    fn skip_semicolon(&mut self) {
        if self.peek_token.is(TokenType::Semicolon) {
            self.next_token();
        }
    }

    fn expect_peek(&mut self, expected: TokenType) -> Result<()> {
        if self.peek_token.is(expected) {
            self.next_token();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected,
                got: self.peek_token.token_type,
            })
        }
    }
}

/// Convenience for callers that start from source text.
pub fn parse(input: &str) -> std::result::Result<ast::Program, Vec<ParseError>> {
    Parser::new(Lexer::new(input.to_owned())).parse_program()
}
