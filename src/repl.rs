use crate::environment::Environment;
use crate::evaluator;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, BufRead, Write};

static PROMPT: &str = ">> ";

// Bytes that are not UTF-8 become U+FFFD, which the lexer reports as ILLEGAL,
// so a bad line never ends the loop. `None` means end of input.
fn read_line<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if input.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Reads one line per prompt and prints every token scanned from it, `EOF` included.
pub fn start_lexer<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<()> {
    let mut buf = vec![];
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;
        let line = match read_line(&mut input, &mut buf)? {
            Some(line) => line,
            None => return Ok(()),
        };

        for token in Lexer::new(line) {
            writeln!(output, "{}", token)?;
        }
    }
}

/// Reads, evaluates and prints one line at a time against a single global scope.
pub fn start<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<()> {
    let env = Environment::new();
    let mut buf = vec![];
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;
        let line = match read_line(&mut input, &mut buf)? {
            Some(line) => line,
            None => return Ok(()),
        };

        match Parser::new(Lexer::new(line)).parse_program() {
            Err(errors) => {
                for err in errors.iter() {
                    writeln!(output, "\t{}", err)?;
                }
            }
            Ok(program) => match evaluator::eval(&program, &env) {
                Ok(val) => writeln!(output, "{}", val)?,
                Err(err) => writeln!(output, "ERROR: {}", err)?,
            },
        }
    }
}
