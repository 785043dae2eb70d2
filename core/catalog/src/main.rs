use std::io::{self, Write};
use std::process;

use catalog::adapter::{resolve_config, ConfigOverrides};
use catalog::cli::{parse_args, print_completion, ParseOutcome};
use catalog::ports::inbound::RunCatalogApp;
use catalog::wiring::{build_log, wire_catalog};
use common::adapter::StdEnvResolver;
use common::error::Error;

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let config = match parse_args()? {
        ParseOutcome::Run(config) => config,
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(shell, &mut io::stdout());
            return Ok(0);
        }
        ParseOutcome::Help(text) => {
            print!("{}", text);
            return Ok(0);
        }
    };

    let overrides = ConfigOverrides {
        base_url: config.base_url.clone(),
        timeout_secs: config.timeout_secs,
    };
    let client_config = resolve_config(&StdEnvResolver, &overrides)?;
    let log = build_log(&client_config, config.verbose);
    let mut app = wire_catalog(&client_config, log)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = app.run(config.command, &mut out)?;
    out.flush()?;
    Ok(code)
}
