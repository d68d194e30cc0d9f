use super::{Expression, Identifier, Node};
use crate::token::Token;
use derive_more::Display;
use std::fmt::Formatter;
use strum_macros::EnumDiscriminants;

#[derive(Display, Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(StatementKind))]
pub enum Statement {
    Let(LetStatement),
    Return(ReturnStatement),
    Expr(ExpressionStatement),
    Block(BlockStatement),
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        self.into()
    }
}

impl Node for Statement {
    fn token_literal(&self) -> &str {
        match self {
            Self::Let(stmt) => stmt.token_literal(),
            Self::Return(stmt) => stmt.token_literal(),
            Self::Expr(stmt) => stmt.token_literal(),
            Self::Block(stmt) => stmt.token_literal(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    pub token: Token,
    pub name: Identifier,
    pub value: Expression,
}

impl std::fmt::Display for LetStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} = {};",
            self.token_literal(),
            self.name,
            self.value
        )
    }
}

impl Node for LetStatement {
    fn token_literal(&self) -> &str {
        &self.token.literal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub token: Token,
    pub return_value: Option<Expression>,
}

impl std::fmt::Display for ReturnStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} ", self.token_literal())?;
        if let Some(value) = &self.return_value {
            write!(f, "{}", value)?;
        }
        write!(f, ";")
    }
}

impl Node for ReturnStatement {
    fn token_literal(&self) -> &str {
        &self.token.literal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub token: Token,
    pub expression: Expression,
}

impl std::fmt::Display for ExpressionStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl Node for ExpressionStatement {
    fn token_literal(&self) -> &str {
        &self.token.literal
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

// Expression statements get an explicit `;` so that neighbours inside braces
// can't fuse into a call or an infix expression when the text is parsed again.
impl std::fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{{ ")?;
        for stmt in self.statements.iter() {
            match stmt {
                Statement::Expr(_) => write!(f, "{}; ", stmt)?,
                _ => write!(f, "{} ", stmt)?,
            }
        }
        write!(f, "}}")
    }
}

impl Node for BlockStatement {
    fn token_literal(&self) -> &str {
        &self.token.literal
    }
}
