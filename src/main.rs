mod cli;

use awsiplookup::{ClientBuilder, Error, LookupResult};
use clap::Parser;
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    if let Err(error) = stderrlog::new()
        .module(module_path!())
        .verbosity(args.verbose.log_level_filter())
        .init()
    {
        eprintln!("Unable to initialize logging: {error}");
    }

    // Client configuration: environment variables, then command-line overrides
    let mut client_builder = ClientBuilder::new();
    if let Some(url) = &args.url {
        client_builder.url(url);
    }
    if let Some(timeout) = args.timeout {
        client_builder.timeout(timeout);
    }
    let client = client_builder.build();

    let mut lookup_results: Vec<LookupResult> = Vec::with_capacity(args.addresses.len());
    let mut failed = false;

    for address in &args.addresses {
        match client.lookup(address) {
            Ok(lookup_result) => lookup_results.push(lookup_result),
            Err(error @ Error::InvalidAddress(_)) => {
                error!("{error}");
                failed = true;
            }
            Err(error @ Error::FetchFailed(_)) => {
                error!("{error}");
                return ExitCode::FAILURE;
            }
        }
    }

    cli::log::lookup_results(&args.addresses, &lookup_results);

    if !lookup_results.is_empty() {
        match args.output {
            cli::OutputFormat::Table => cli::output::match_table(&lookup_results),
            cli::OutputFormat::Json => {
                if let Err(error) = cli::output::json(&lookup_results) {
                    error!("Unable to serialize lookup results: {error}");
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
