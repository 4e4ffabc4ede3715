//! Fixture plugin: answers with one line per wrapped document.
//!
//! Each line is `<wrapper name>: <title> (<format> <version>)`. Used by the
//! plugin dispatch tests.

use std::process::ExitCode;

use openapic_plugin::sdk::{read_request, write_response};
use openapic_plugin::PluginResponse;

fn main() -> ExitCode {
    let request = match read_request(std::io::stdin().lock()) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("openapi_echo: {e}");
            return ExitCode::FAILURE;
        }
    };
    let documents = match request.documents() {
        Ok(documents) => documents,
        Err(e) => {
            eprintln!("openapi_echo: {e}");
            return ExitCode::FAILURE;
        }
    };

    let text = documents
        .iter()
        .map(|(name, document)| {
            format!(
                "{name}: {} ({} {})\n",
                document.title,
                document.format(),
                document.spec_version
            )
        })
        .collect();

    match write_response(std::io::stdout().lock(), &PluginResponse { text }) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("openapi_echo: {e}");
            ExitCode::FAILURE
        }
    }
}
