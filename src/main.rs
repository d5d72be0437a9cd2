// SPDX-License-Identifier: MIT OR Apache-2.0

//! msearch - search file names, file contents and symbol tables

use std::process::ExitCode;

use msearch::config::Config;
use msearch::driver::{Driver, Outcome};
use msearch::errors::{DriverError, Result};
use msearch::registry::ModuleRegistry;
use msearch::schema::SharedSchema;

fn main() -> ExitCode {
    msearch::logging::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(DriverError::Parse(err)) => {
            // clap renders its own message, usage included
            let _ = err.print();
            ExitCode::from(err.exit_code().clamp(0, 255) as u8)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code().clamp(0, 255) as u8)
        }
    }
}

fn run() -> Result<()> {
    let config = Config::load();
    if let Some(color) = config.color {
        colored::control::set_override(color);
    }

    let schema = SharedSchema::default();
    let registry = ModuleRegistry::builtin(config.default_module(), &schema.global_spellings())?;
    let driver = Driver::new(registry, &schema)?.ignored_dirs(config.ignored_dirs());

    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    match driver.dispatch(&args)? {
        Outcome::Help(text) | Outcome::Version(text) => println!("{text}"),
        Outcome::Completed { module, matches } => {
            tracing::debug!(module, matches, "search finished");
        }
    }
    Ok(())
}
