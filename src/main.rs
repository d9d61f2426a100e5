use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use release_builder::prelude::*;

fn main() -> ExitCode {
    let matches = get_matches();

    let log_file = match get_log_file(&matches) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("{}", format_message(&e.to_string(), &e.to_string().red().to_string()));
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logger(get_verbosity(&matches), log_file.as_deref()) {
        eprintln!("Failed to initialise logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let outcome = get_release_options(&matches)
        .map_err(anyhow::Error::from)
        .and_then(|options| make_release(&options));
    match outcome {
        Ok(outcome) => {
            if let Some(archive) = &outcome.archive {
                let message = format!("Release archive: {}", archive.display());
                info!("{}", format_message(&message, &message.green().to_string()));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
