use crate::ast;
use crate::environment::Env;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

mod eval_error;
pub use eval_error::EvalError;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Function(FunctionObject),
    ReturnValue(Box<Object>),
    Integer(i64),
    Boolean(bool),
    Null,
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Function(func) => write!(f, "{}", func),
            Self::ReturnValue(obj) => write!(f, "{}", obj),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::Null
    }
}

impl From<i64> for Object {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<FunctionObject> for Object {
    fn from(func: FunctionObject) -> Self {
        Self::Function(func)
    }
}

impl Object {
    pub fn is_return_value(&self) -> bool {
        matches!(self, Self::ReturnValue(_))
    }

    pub fn unwrap_return(self) -> Self {
        match self {
            Self::ReturnValue(o) => *o,
            obj => obj,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Function(_) => "FUNCTION",
            Self::ReturnValue(o) => o.type_name(),
            Self::Boolean(_) => "BOOLEAN",
            Self::Integer(_) => "INTEGER",
            Self::Null => "NULL",
        }
    }

    pub fn truth_value(&self) -> bool {
        !matches!(self, Self::Boolean(false) | Self::Null)
    }
}

/// A function value together with the scope it was defined in.
///
/// Parameters and body are shared, so looking a function up by name never
/// copies its syntax tree.
#[derive(Debug, Clone)]
pub struct FunctionObject {
    pub parameters: Rc<[ast::Identifier]>,
    pub body: Rc<ast::BlockStatement>,
    pub env: Env,
}

// Scopes are compared by identity; a closure stored in its own defining scope
// would otherwise recurse forever.
impl PartialEq for FunctionObject {
    fn eq(&self, other: &Self) -> bool {
        self.parameters == other.parameters
            && self.body == other.body
            && Rc::ptr_eq(&self.env, &other.env)
    }
}

impl Display for FunctionObject {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let identifier_names: Vec<String> = self
            .parameters
            .iter()
            .map(ast::Identifier::to_string)
            .collect();

        write!(f, "fn({}) {}", identifier_names.join(", "), self.body)
    }
}
