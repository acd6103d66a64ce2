use clap::Parser;
use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod schema;

use cli::{Cli, Commands, ConfigCommands};
use commands::{CommandContext, CommandError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let error_json = serde_json::json!({
                    "error": {
                        "code": error_code(&e),
                        "message": e.to_string(),
                    }
                });
                match serde_json::to_string_pretty(&error_json) {
                    Ok(rendered) => eprintln!("{rendered}"),
                    Err(_) => eprintln!("Error: {e}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            error_exit_code(&e)
        }
    }
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the verbosity flags.
fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore the error raised when a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> commands::Result<()> {
    let ctx = CommandContext::from_cli(cli);

    match &cli.command {
        Commands::Filter {
            schema,
            query,
            order_by,
            descending,
            page,
            page_size,
            input,
        } => {
            let opts = commands::filter::FilterOptions {
                schema: schema.clone(),
                query: query.clone().unwrap_or_default(),
                order_by: order_by.clone(),
                descending: *descending,
                page: *page,
                page_size: *page_size,
                input: input.clone(),
            };
            commands::filter::execute(&ctx, &opts)
        }
        Commands::Check { schema, query } => commands::check::execute(&ctx, schema, query),
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::execute_path(&ctx),
            ConfigCommands::Show => commands::config::execute_show(&ctx),
        },
    }
}

/// Returns the error code string for JSON output.
fn error_code(e: &CommandError) -> &'static str {
    match e {
        CommandError::Filter(_) => "FILTER_ERROR",
        CommandError::Config(_) | CommandError::NoConfigDir => "CONFIG_ERROR",
        CommandError::Schema(_) => "SCHEMA_ERROR",
        CommandError::Io(_) => "IO_ERROR",
        CommandError::Json(_) => "JSON_ERROR",
    }
}

/// Returns the exit code for an error.
fn error_exit_code(e: &CommandError) -> ExitCode {
    match e {
        CommandError::Filter(_) => ExitCode::from(1),
        CommandError::Json(_) => ExitCode::from(1),
        CommandError::Io(_) => ExitCode::from(3),
        CommandError::Config(_) => ExitCode::from(5),
        CommandError::NoConfigDir => ExitCode::from(5),
        CommandError::Schema(_) => ExitCode::from(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recfilter::FilterError;

    #[test]
    fn test_error_exit_codes() {
        let cases = [
            (CommandError::Filter(FilterError::EmptyExpression), ExitCode::from(1)),
            (CommandError::Schema("bad".to_string()), ExitCode::from(5)),
            (
                CommandError::Io(io::Error::new(io::ErrorKind::NotFound, "missing")),
                ExitCode::from(3),
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error_exit_code(&error), expected, "error: {error}");
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            error_code(&CommandError::Filter(FilterError::EmptyExpression)),
            "FILTER_ERROR"
        );
        assert_eq!(error_code(&CommandError::Schema(String::new())), "SCHEMA_ERROR");
    }
}
