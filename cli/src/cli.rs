use std::time::Duration;

use chain::Address;
use clap::Parser;
use clap::error::ErrorKind;

#[derive(Debug, Parser)]
#[clap(name = "create-metrics-tasks", version)]
pub struct Cli {
    /// Hook contract to open metrics tasks for
    pub hook_address: Address,

    /// Task period in milliseconds (defaults to CHECK_INTERVAL, then 24000)
    #[clap(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Create a single task and exit
    #[clap(long)]
    pub once: bool,
}

impl Cli {
    /// Parse `std::env::args`. Usage errors exit with status 1; help and version exit 0.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => {
                let _ = e.print();
                std::process::exit(1);
            }
        }
    }

    /// `--interval-ms` wins over the configured period.
    pub fn interval(&self, configured: Duration) -> Duration {
        self.interval_ms
            .map(Duration::from_millis)
            .unwrap_or(configured)
    }
}
