// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, build the configuration once and
//   hand both to the command pipelines.
// - Exit status is 0 only for a successful transfer; everything else is 1.

use std::process::ExitCode;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use shareio::cli::{Cli, Commands};
use shareio::commands;
use shareio::config::Config;
use shareio::ui::Terminal;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ClapErrorKind::DisplayHelp
                | ClapErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => {
                    eprintln!("See --help for a list of available commands.");
                    ExitCode::FAILURE
                }
            };
        }
    };

    // A missing .env file is not an error.
    let dotenv = dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing(cli.verbose || config.development);
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }
    debug!(?config, "resolved configuration");

    match run(cli, &config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Unexpected error: {err:#}");
            if config.development {
                error!("{err:?}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &Config) -> anyhow::Result<ExitCode> {
    let term = Terminal::new(config);
    let report = match cli.command {
        Some(Commands::Post { file, pass }) => commands::post(config, &term, &file, pass.as_deref())?,
        Some(Commands::Get { code, pass, output }) => {
            commands::get(config, &term, &code, pass.as_deref(), output.as_deref())?
        }
        None => {
            Cli::command().print_help()?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    term.render(&report)?;
    Ok(if report.exit_code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "shareio=debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
