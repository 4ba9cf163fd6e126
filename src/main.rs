//! side-runner - Selenium IDE scenario runner
//!
//! Manages `.side` scenario files, executes them on a Selenium grid and
//! extracts failed assertions from the produced reports.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use commands::Commands;
use side_runner::common::{logging, Config, ErrorReport};
use side_runner::{cli, commands};

#[derive(Parser)]
#[command(name = "side-runner", about = "Run Selenium IDE scenarios on a browser grid")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let args = Cli::parse();
    let json = args.json;

    let result = async {
        let config = Config::load(args.config.as_deref())?;
        let ctx = cli::Context {
            config: Arc::new(config),
            json,
        };
        cli::dispatch(args.command, &ctx).await
    }
    .await;

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if json {
                let report = ErrorReport::from(&e);
                match serde_json::to_string_pretty(&report) {
                    Ok(text) => println!("{text}"),
                    Err(_) => eprintln!("Error: {e}"),
                }
            } else {
                eprintln!("Error: {e}");
            }
            std::process::exit(cli::exit_code(&e));
        }
    }
}
