use clap::{Parser, ValueEnum};

/*-------------------------------------------------------------------------------------------------
  Command Line Interface (CLI) Arguments
-------------------------------------------------------------------------------------------------*/

#[derive(Parser, Debug)]
#[command(author, version, about="Find the AWS IP ranges that contain IP addresses.", long_about = None)]
pub struct Args {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// URL of the AWS IP Ranges JSON [default: $AWSIPLOOKUP_URL or the AWS published URL]
    #[arg(long)]
    pub url: Option<String>,

    /// Fetch timeout in milliseconds, 0 to wait indefinitely [default: $AWSIPLOOKUP_TIMEOUT or 10000]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Logging verbosity
    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,

    /// IP addresses to look up
    #[arg(required = true)]
    pub addresses: Vec<String>,
}

/*--------------------------------------------------------------------------------------
  Output Format
--------------------------------------------------------------------------------------*/

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Table of matching AWS IP prefixes
    Table,
    /// JSON lookup results
    Json,
}
