use monkey::repl;
use std::env;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Logging stays off unless RUST_LOG is set, and goes to stderr so it never
// interleaves with REPL output.
fn init_tracing() {
    if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() -> io::Result<()> {
    init_tracing();

    println!("Hello! This is the Monkey programming language!");
    println!("Feel free to type in commands");

    let stdin = io::stdin();
    let stdout = io::stdout();
    if env::var("INTERPRET").is_ok() {
        repl::start(stdin.lock(), stdout.lock())
    } else {
        repl::start_lexer(stdin.lock(), stdout.lock())
    }
}
