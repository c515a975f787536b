use anyhow::Context;
use bandmath::{output, repl, runner, Config, Environment};
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::from_matches(&Config::command().get_matches());

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .init();

    match execute(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

/// `Ok(false)` when a diagnostic was already reported.
fn execute(config: &Config) -> anyhow::Result<bool> {
    let env = Environment::new(config.file_source());

    if config.wants_repl() {
        repl::start(&env);
        return Ok(true);
    }

    let (source, filename) = match (&config.script, &config.expr) {
        (Some(path), _) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("read script {}", path.display()))?;
            (source, Some(path.display().to_string()))
        }
        (None, Some(expr)) => (expr.clone(), None),
        (None, None) => return Ok(true),
    };

    let Some(result) = runner::run(&source, filename.as_deref(), &env) else {
        return Ok(false);
    };
    println!("{}", result);

    if let Some(out) = &config.out {
        let grid = result
            .as_grid()
            .with_context(|| format!("--out needs a raster result, got {}", result.type_name()))?;
        output::write_png(grid, out)?;
    }

    Ok(true)
}
