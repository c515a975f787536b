use crate::error::BandmathError;
use crate::evaluator::{Environment, Evaluator};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Object;

/// Parses and evaluates `source`. Syntax errors are returned as a list and
/// the evaluator never runs; a runtime failure comes back as `Object::Error`.
pub fn interpret(source: &str, evaluator: &mut Evaluator<'_>) -> Result<Object, Vec<BandmathError>> {
    let tokens = Lexer::new(source).scan_tokens();
    tracing::trace!(tokens = tokens.len(), "tokenized");

    let program = Parser::new(tokens).parse()?;
    tracing::debug!(statements = program.statements.len(), "parsed program");

    Ok(evaluator.evaluate(&program))
}

/// Runs one source text, reporting diagnostics to stderr. Returns the
/// program's value unless a syntax or runtime error was reported.
pub fn run(source: &str, filename: Option<&str>, env: &Environment) -> Option<Object> {
    let mut evaluator = Evaluator::new(env);
    run_with(source, filename, &mut evaluator)
}

pub(crate) fn run_with(source: &str, filename: Option<&str>, evaluator: &mut Evaluator<'_>) -> Option<Object> {
    match interpret(source, evaluator) {
        Ok(Object::Error(error)) => {
            error.report(source, filename);
            None
        }
        Ok(object) => Some(object),
        Err(errors) => {
            for error in &errors {
                error.report(source, filename);
            }
            None
        }
    }
}
