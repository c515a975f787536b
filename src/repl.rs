use crate::evaluator::{Environment, Evaluator};
use crate::runner::run_with;
use std::io::{self, Write};

/// Interactive loop. Bands read once stay cached for the whole session.
pub fn start(env: &Environment) {
    println!("bandmath {}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut evaluator = Evaluator::new(env);

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }

                if let Some(object) = run_with(line, None, &mut evaluator) {
                    println!("{}", object);
                }
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}
