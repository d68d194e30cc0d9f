pub mod ast;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod repl;
mod stack;
pub mod token;

pub use environment::{Env, Environment};
pub use lexer::Lexer;
pub use parser::Parser;
