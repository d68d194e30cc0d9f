use super::{statement::BlockStatement, Identifier, Node};
use crate::token::{Token, TokenType};
use derive_more::Display;
use std::fmt::Formatter;
use strum_macros::EnumDiscriminants;

#[derive(Display, Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ExpressionKind))]
pub enum Expression {
    Identifier(Identifier),
    IntegerLiteral(IntegerLiteral),
    Boolean(Boolean),
    Prefix(PrefixExpression),
    Infix(InfixExpression),
    If(IfExpression),
    Function(FunctionLiteral),
    Call(CallExpression),
}

impl Expression {
    pub fn kind(&self) -> ExpressionKind {
        self.into()
    }
}

impl Node for Expression {
    fn token_literal(&self) -> &str {
        match self {
            Self::Identifier(expr) => expr.token_literal(),
            Self::IntegerLiteral(expr) => expr.token_literal(),
            Self::Boolean(expr) => expr.token_literal(),
            Self::Prefix(expr) => expr.token_literal(),
            Self::Infix(expr) => expr.token_literal(),
            Self::If(expr) => expr.token_literal(),
            Self::Function(expr) => expr.token_literal(),
            Self::Call(expr) => expr.token_literal(),
        }
    }
}

macro_rules! token_node {
    ($($node:ty),* $(,)?) => {
        $(
            impl Node for $node {
                fn token_literal(&self) -> &str {
                    &self.token.literal
                }
            }
        )*
    };
}

token_node!(
    IntegerLiteral,
    Boolean,
    PrefixExpression,
    InfixExpression,
    IfExpression,
    FunctionLiteral,
    CallExpression,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Operator {
    #[strum(to_string = "!")]
    Bang,
    #[strum(to_string = "-")]
    Minus,
    #[strum(to_string = "+")]
    Plus,
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
}

impl Operator {
    pub fn from_token_type(token_type: TokenType) -> Option<Self> {
        Some(match token_type {
            TokenType::Bang => Self::Bang,
            TokenType::Minus => Self::Minus,
            TokenType::Plus => Self::Plus,
            TokenType::Asterisk => Self::Asterisk,
            TokenType::Slash => Self::Slash,
            TokenType::LT => Self::LT,
            TokenType::GT => Self::GT,
            TokenType::Eq => Self::Eq,
            TokenType::NotEq => Self::NotEq,
            _ => return None,
        })
    }
}

/// Renders as the source text it was scanned from, so `007` stays `007`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerLiteral {
    pub token: Token,
    pub value: i64,
}

impl std::fmt::Display for IntegerLiteral {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.token.literal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boolean {
    pub token: Token,
    pub value: bool,
}

impl std::fmt::Display for Boolean {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression {
    pub token: Token,
    pub operator: Operator,
    pub right: Box<Expression>,
}

impl std::fmt::Display for PrefixExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({}{})", self.operator, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    pub token: Token,
    pub left: Box<Expression>,
    pub operator: Operator,
    pub right: Box<Expression>,
}

impl std::fmt::Display for InfixExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "({} {} {})", self.left, self.operator, self.right)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpression {
    pub token: Token,
    pub condition: Box<Expression>,
    pub consequence: BlockStatement,
    pub alternative: Option<BlockStatement>,
}

impl std::fmt::Display for IfExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "if ({}) {}", self.condition, self.consequence)?;
        if let Some(alt) = &self.alternative {
            write!(f, " else {}", alt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub token: Token,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

impl std::fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let identifier_names: Vec<String> =
            self.parameters.iter().map(Identifier::to_string).collect();

        write!(
            f,
            "{}({}) {}",
            self.token_literal(),
            identifier_names.join(", "),
            self.body
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub token: Token,
    pub function: Box<Expression>,
    pub arguments: Vec<Expression>,
}

impl std::fmt::Display for CallExpression {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let argument_names: Vec<String> =
            self.arguments.iter().map(Expression::to_string).collect();

        write!(f, "{}({})", self.function, argument_names.join(", "))
    }
}
