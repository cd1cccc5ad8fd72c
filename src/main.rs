//! npmjack - dependency confusion scanner for exposed web assets.
//!
//! CLI entry point.

use clap::Parser;
use npmjack::notify::{outfile_line, ConsoleOutput};
use npmjack::{Cli, Runner, ScanResult};
use std::fs;
use std::io::Write;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.silence {
        EnvFilter::new("off")
    } else if cli.verbose {
        EnvFilter::new("npmjack=debug,info")
    } else {
        EnvFilter::new("npmjack=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

async fn run(cli: Cli) -> Result<(), ExitCode> {
    let targets = cli.load_targets().map_err(|e| {
        error!("Failed to load targets: {}", e);
        ExitCode::FAILURE
    })?;

    if targets.is_empty() {
        error!("No targets specified. Use -u <url>, -i <file> or pipe URLs on stdin.");
        return Err(ExitCode::FAILURE);
    }

    let runner = Runner::new(cli.options()).map_err(|e| {
        error!("Failed to create runner: {}", e);
        ExitCode::FAILURE
    })?;

    let console = ConsoleOutput::new(cli.hide_claimed, cli.silence);
    console.print_scan_start(targets.len());

    let (mut stream, handle) = runner.start(targets);

    let mut results: Vec<ScanResult> = Vec::new();
    while let Some(result) = stream.recv().await {
        console.print_result(&result);
        results.push(result);
    }

    match handle.await {
        Ok(Ok(dispatched)) => info!("{} target(s) scanned", dispatched),
        Ok(Err(e)) => {
            error!("Scan failed: {}", e);
            return Err(ExitCode::FAILURE);
        }
        Err(e) => {
            error!("Scan task panicked: {}", e);
            return Err(ExitCode::FAILURE);
        }
    }

    let unclaimed: usize = results.iter().map(|r| r.unclaimed().count()).sum();
    console.print_summary(results.len(), unclaimed);

    if let Some(ref path) = cli.outfile {
        if let Err(e) = write_outfile(path, &results, cli.json) {
            error!("Failed to write output file: {}", e);
            return Err(ExitCode::FAILURE);
        }
        info!("Results written to: {:?}", path);
    } else if cli.json {
        let json = serde_json::to_string_pretty(&results).unwrap_or_default();
        println!("{}", json);
    }

    Ok(())
}

fn write_outfile(path: &std::path::Path, results: &[ScanResult], json: bool) -> npmjack::Result<()> {
    if json {
        fs::write(path, serde_json::to_string_pretty(results)?)?;
        return Ok(());
    }

    let mut file = fs::File::create(path)?;
    for result in results {
        writeln!(file, "{}", outfile_line(result))?;
    }
    Ok(())
}
