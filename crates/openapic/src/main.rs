//! openapic command-line compiler.
//!
//! Compiles one OpenAPI/Swagger document, writes the requested encodings and
//! runs at most one plugin. Plugin text goes to stdout; everything else goes
//! to stderr.

mod cli;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use openapic_compiler::run;

use crate::cli::Cli;

/// Exit status for a fatal compile error (-1 as an unsigned byte).
const EXIT_FATAL: u8 = 255;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config) = cli.compiler_config() else {
        print_usage();
        return ExitCode::SUCCESS;
    };
    if !config.has_output_directives() {
        eprintln!("Missing output directives.");
        print_usage();
        return ExitCode::SUCCESS;
    }

    if let Err(e) = openapic_telemetry::init(&cli.telemetry_config()) {
        eprintln!("warning: {e}");
    }
    tracing::debug!(?config, "starting");

    let dispatcher = config.dispatcher();
    let mut stdout = std::io::stdout().lock();
    match run(&config, &dispatcher, &mut stdout).await {
        Ok(report) => {
            for output in report.outputs.iter().filter(|o| o.is_ok()) {
                eprintln!("wrote {} output: {}", output.encoding, output.path.display());
            }
            for failure in report.failure_messages() {
                eprintln!("error: {failure}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn print_usage() {
    eprintln!("{}", Cli::command().render_help());
}
