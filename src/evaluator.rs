use crate::ast::{self, Expression, Statement};
use crate::environment::{Env, Environment};
use crate::object::{EvalError, FunctionObject, Object, Result};
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;
use tracing::{debug, trace};

/// Deepest chain of nested function calls before evaluation gives up.
pub const MAX_CALL_DEPTH: usize = 4096;

/// Evaluates a program in `env`, which persists across calls so bindings survive
/// between REPL lines. A top-level `return` ends the program with its value.
pub fn eval(program: &ast::Program, env: &Env) -> Result<Object> {
    let mut result = Object::Null;
    for stmt in program.statements.iter() {
        result = eval_statement(stmt, env, 0)?;
        if result.is_return_value() {
            return Ok(result.unwrap_return());
        }
    }
    Ok(result)
}

// Unlike `eval`, leaves a return value wrapped so it unwinds through every
// enclosing block up to the function call.
fn eval_block_statement(block: &ast::BlockStatement, env: &Env, depth: usize) -> Result<Object> {
    let mut result = Object::Null;
    for stmt in block.statements.iter() {
        result = eval_statement(stmt, env, depth)?;
        if result.is_return_value() {
            break;
        }
    }
    Ok(result)
}

fn eval_statement(stmt: &Statement, env: &Env, depth: usize) -> Result<Object> {
    match stmt {
        Statement::Expr(stmt) => eval_expression(&stmt.expression, env, depth),
        Statement::Let(stmt) => {
            let value = eval_expression(&stmt.value, env, depth)?;
            env.borrow_mut().set(&stmt.name.value, value);
            Ok(Object::Null)
        }
        Statement::Return(stmt) => {
            let value = match &stmt.return_value {
                Some(expr) => eval_expression(expr, env, depth)?,
                None => Object::Null,
            };
            Ok(Object::ReturnValue(Box::new(value)))
        }
        Statement::Block(block) => eval_block_statement(block, env, depth),
    }
}

fn eval_expression(expr: &Expression, env: &Env, depth: usize) -> Result<Object> {
    ensure_sufficient_stack(|| match expr {
        Expression::Identifier(ident) => eval_identifier(ident, env),
        Expression::IntegerLiteral(lit) => Ok(Object::Integer(lit.value)),
        Expression::Boolean(b) => Ok(Object::Boolean(b.value)),
        Expression::Prefix(prefix) => {
            let right = eval_expression(&prefix.right, env, depth)?;
            eval_prefix_expression(prefix.operator, right)
        }
        Expression::Infix(infix) => {
            let left = eval_expression(&infix.left, env, depth)?;
            let right = eval_expression(&infix.right, env, depth)?;
            eval_infix_expression(infix.operator, left, right)
        }
        Expression::If(if_expr) => {
            let condition = eval_expression(&if_expr.condition, env, depth)?;
            if condition.truth_value() {
                eval_block_statement(&if_expr.consequence, env, depth)
            } else if let Some(alt) = &if_expr.alternative {
                eval_block_statement(alt, env, depth)
            } else {
                Ok(Object::Null)
            }
        }
        Expression::Function(func) => Ok(FunctionObject {
            parameters: func.parameters.clone().into(),
            body: Rc::new(func.body.clone()),
            env: Rc::clone(env),
        }
        .into()),
        Expression::Call(call) => {
            let function = eval_expression(&call.function, env, depth)?;
            let args = call
                .arguments
                .iter()
                .map(|arg| eval_expression(arg, env, depth))
                .collect::<Result<Vec<_>>>()?;
            apply_function(function, args, depth)
        }
    })
}

fn eval_identifier(ident: &ast::Identifier, env: &Env) -> Result<Object> {
    let value = env.borrow().get(&ident.value);
    value.ok_or_else(|| {
        debug!(name = %ident.value, "unbound identifier");
        EvalError::IdentifierNotFound {
            id: ident.value.clone(),
        }
    })
}

fn apply_function(function: Object, args: Vec<Object>, depth: usize) -> Result<Object> {
    let func = match function {
        Object::Function(func) => func,
        obj => {
            return Err(EvalError::NotAFunction {
                type_name: obj.type_name(),
            })
        }
    };

    if func.parameters.len() != args.len() {
        return Err(EvalError::IncorrectArity {
            got: args.len(),
            want: func.parameters.len(),
        });
    }

    if depth >= MAX_CALL_DEPTH {
        debug!(depth, "call depth limit reached");
        return Err(EvalError::StackOverflow {
            limit: MAX_CALL_DEPTH,
        });
    }

    trace!(function = %func, depth, "entering call scope");
    let call_env = Environment::new_enclosed(&func.env);
    {
        let mut scope = call_env.borrow_mut();
        for (param, arg) in func.parameters.iter().zip(args) {
            scope.set(&param.value, arg);
        }
    }

    Ok(eval_block_statement(&func.body, &call_env, depth + 1)?.unwrap_return())
}

fn eval_prefix_expression(operator: ast::Operator, right: Object) -> Result<Object> {
    match (operator, right) {
        (ast::Operator::Bang, right) => Ok(Object::Boolean(!right.truth_value())),
        (ast::Operator::Minus, Object::Integer(n)) => Ok(Object::Integer(n.wrapping_neg())),
        (operator, right) => Err(EvalError::UnknownPrefixOperator {
            operator,
            operand: right.type_name(),
        }),
    }
}

fn eval_infix_expression(operator: ast::Operator, left: Object, right: Object) -> Result<Object> {
    match (operator, left, right) {
        (op, Object::Integer(x), Object::Integer(y)) => eval_integer_infix_expression(op, x, y),
        (ast::Operator::Eq, left, right) => Ok(Object::Boolean(left == right)),
        (ast::Operator::NotEq, left, right) => Ok(Object::Boolean(left != right)),
        (op, left, right) => Err(EvalError::binary_op_error(
            left.type_name(),
            op,
            right.type_name(),
        )),
    }
}

fn eval_integer_infix_expression(operator: ast::Operator, left: i64, right: i64) -> Result<Object> {
    Ok(match operator {
        ast::Operator::Plus => Object::Integer(left.wrapping_add(right)),
        ast::Operator::Minus => Object::Integer(left.wrapping_sub(right)),
        ast::Operator::Asterisk => Object::Integer(left.wrapping_mul(right)),
        ast::Operator::Slash => {
            if right == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Object::Integer(left.wrapping_div(right))
        }
        ast::Operator::LT => Object::Boolean(left < right),
        ast::Operator::GT => Object::Boolean(left > right),
        ast::Operator::Eq => Object::Boolean(left == right),
        ast::Operator::NotEq => Object::Boolean(left != right),
        op => return Err(EvalError::binary_op_error("INTEGER", op, "INTEGER")),
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;

    fn test_eval(input: &str) -> Result<Object> {
        let program = parse(input).expect("Parse errors found");
        eval(&program, &Environment::new())
    }

    fn test_integer_object(obj: &Object, expected: i64) {
        match obj {
            Object::Integer(n) => assert_eq!(*n, expected),
            other => panic!("expected integer {}, got {:?}", expected, other),
        }
    }

    fn test_boolean_object(obj: &Object, expected: bool) {
        match obj {
            Object::Boolean(b) => assert_eq!(*b, expected),
            other => panic!("expected boolean {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn test_eval_integer_expression() {
        let cases = vec![
            ("5", 5),
            ("10", 10),
            ("-5", -5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("5 * 2 + 10", 20),
            ("5 + 2 * 10", 25),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("2 * (5 + 10)", 30),
            ("3 * 3 * 3 + 10", 37),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
        ];

        for (input, output) in cases.into_iter() {
            let evaluated = test_eval(input).unwrap();
            test_integer_object(&evaluated, output);
        }
    }

    #[test]
    fn test_eval_boolean_expression() {
        let cases = vec![
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 < 1", false),
            ("1 > 1", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("1 == 2", false),
            ("1 != 2", true),
            ("true == true", true),
            ("false == false", true),
            ("true == false", false),
            ("true != false", true),
            ("false != true", true),
            ("(1 < 2) == true", true),
            ("(1 < 2) == false", false),
            ("(1 > 2) == true", false),
            ("(1 > 2) == false", true),
        ];

        for (input, output) in cases.into_iter() {
            let evaluated = test_eval(input).unwrap();
            test_boolean_object(&evaluated, output);
        }
    }

    #[test]
    fn test_bang_operator() {
        let cases = vec![
            ("!true", false),
            ("!false", true),
            ("!5", false),
            ("!!true", true),
            ("!!false", false),
            ("!!5", true),
        ];

        for (input, output) in cases.into_iter() {
            let evaluated = test_eval(input).unwrap();
            test_boolean_object(&evaluated, output);
        }
    }

    #[test]
    fn test_if_else_expressions() {
        let cases = vec![
            ("if (true) { 10 }", Object::Integer(10)),
            ("if (false) { 10 }", Object::Null),
            ("if (1) { 10 }", Object::Integer(10)),
            ("if (1 < 2) { 10 }", Object::Integer(10)),
            ("if (1 > 2) { 10 }", Object::Null),
            ("if (1 > 2) { 10 } else { 20 }", Object::Integer(20)),
            ("if (1 < 2) { 10 } else { 20 }", Object::Integer(10)),
        ];

        for (input, output) in cases.into_iter() {
            assert_eq!(test_eval(input).unwrap(), output);
        }
    }

    #[test]
    fn test_return_statements() {
        let cases = vec![
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("return 2 * 5; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
            (
                "if (10 > 1) {
                   if (10 > 1) {
                     return 10;
                   }
                   return 1;
                 }",
                10,
            ),
        ];

        for (input, output) in cases.into_iter() {
            let evaluated = test_eval(input).unwrap();
            test_integer_object(&evaluated, output);
        }

        assert_eq!(test_eval("return; 5").unwrap(), Object::Null);
    }

    #[test]
    fn test_error_handling() {
        let cases = vec![
            ("5 + true;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; true + false; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "if (10 > 1) { true + false; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            (
                "if (10 > 1) {
                   if (10 > 1) {
                     return true + false;
                   }
                   return 1;
                 }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            ("10 / (5 - 5)", "division by zero"),
            ("5(1)", "not a function: INTEGER"),
            ("fn(x) { x }(1, 2)", "wrong number of arguments. got=2, want=1"),
        ];

        for (input, message) in cases.into_iter() {
            let err = test_eval(input).unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_let_statements() {
        let cases = vec![
            ("let a = 5; a;", 5),
            ("let a = 5 * 5; a;", 25),
            ("let a = 5; let b = a; b;", 5),
            ("let a = 5; let b = a; let c = a + b + 5; c;", 15),
        ];

        for (input, output) in cases.into_iter() {
            let evaluated = test_eval(input).unwrap();
            test_integer_object(&evaluated, output);
        }
    }

    #[test]
    fn test_function_object() {
        match test_eval("fn(x) { x + 2; };").unwrap() {
            Object::Function(func) => {
                assert_eq!(func.parameters.len(), 1);
                assert_eq!(func.parameters[0].to_string(), "x");
                assert_eq!(func.body.to_string(), "{ (x + 2); }");
                assert_eq!(func.to_string(), "fn(x) { (x + 2); }");
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_function_application() {
        let cases = vec![
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5, 5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("fn(x) { x; }(5)", 5),
        ];

        for (input, output) in cases.into_iter() {
            let evaluated = test_eval(input).unwrap();
            test_integer_object(&evaluated, output);
        }
    }

    #[test]
    fn test_closures() {
        let input = "
let newAdder = fn(x) {
  fn(y) { x + y };
};

let addTwo = newAdder(2);
addTwo(2);";
        test_integer_object(&test_eval(input).unwrap(), 4);
    }

    #[test]
    fn test_scope_is_lexical_not_dynamic() {
        let input = "
let x = 10;
let f = fn() { x };
let g = fn(x) { f() };
g(20);";
        test_integer_object(&test_eval(input).unwrap(), 10);
    }

    #[test]
    fn test_call_does_not_rebind_outer() {
        let env = Environment::new();
        let program = parse("let x = 1; let f = fn() { let x = 2; x }; f();").unwrap();
        test_integer_object(&eval(&program, &env).unwrap(), 2);
        assert_eq!(env.borrow().get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn test_recursion() {
        let input = "
let fibonacci = fn(x) {
  if (x < 2) { return x; }
  fibonacci(x - 1) + fibonacci(x - 2);
};
fibonacci(15);";
        test_integer_object(&test_eval(input).unwrap(), 610);
    }

    #[test]
    fn test_lookup_shares_function_body() {
        let env = Environment::new();
        eval(&parse("let f = fn(x) { x };").unwrap(), &env).unwrap();
        let first = env.borrow().get("f");
        let second = env.borrow().get("f");
        match (first, second) {
            (Some(Object::Function(a)), Some(Object::Function(b))) => {
                assert!(Rc::ptr_eq(&a.body, &b.body));
                assert!(Rc::ptr_eq(&a.parameters, &b.parameters));
            }
            other => panic!("expected two functions, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_recursion() {
        let input = "
let count = fn(n) { if (n == 0) { 0 } else { 1 + count(n - 1) } };
count(1000);";
        test_integer_object(&test_eval(input).unwrap(), 1000);
    }

    #[test]
    fn test_runaway_recursion_is_an_error() {
        let input = "let forever = fn(n) { forever(n + 1) }; forever(0);";
        let err = test_eval(input).unwrap_err();
        assert_eq!(
            err,
            EvalError::StackOverflow {
                limit: MAX_CALL_DEPTH
            }
        );
        assert_eq!(err.to_string(), "stack overflow: call depth exceeded 4096");
    }

    #[test]
    fn test_bindings_persist_across_programs() {
        let env = Environment::new();
        eval(&parse("let a = 3;").unwrap(), &env).unwrap();
        let evaluated = eval(&parse("a * 2").unwrap(), &env).unwrap();
        test_integer_object(&evaluated, 6);
    }

    #[test]
    fn test_empty_program_is_null() {
        assert_eq!(test_eval("").unwrap(), Object::Null);
    }
}
