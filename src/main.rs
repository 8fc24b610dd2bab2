// main.rs
use std::process::ExitCode;

use clap::Parser;
use devtools_inject::{Config, compose_message, logger, run_macro};
use tracing::{error, info};

/// Type a message into the editor's composer and send it.
#[derive(Parser, Debug)]
#[command(name = "devtools-inject", version)]
struct Args {
    /// The message to send
    message: String,

    /// Append " @Web" so the composer searches the web
    #[arg(long)]
    web: bool,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let cfg = Config::from_env()?;
    info!(?cfg, web = args.web, "starting");
    let script = compose_message(&args.message, args.web);
    run_macro(&cfg, &script)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    // Logging is best effort; stdout carries the one status line either way.
    let _guard = logger::init(env!("CARGO_PKG_NAME")).ok();

    match run(&args) {
        Ok(()) => {
            println!("Success");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            println!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
