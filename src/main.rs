use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use team_balancer::{HighsSolver, RunConfig, balance, io, server};

#[derive(Parser)]
#[command(name = "team_balancer", about = "Balance signed-up players into role-complete teams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve one roster and write the run outputs
    Solve {
        #[arg(long, default_value = "./config.yaml")]
        config: PathBuf,
        #[arg(long, default_value = "./signups.csv")]
        signups: PathBuf,
        /// Override the configured time budget in seconds
        #[arg(long)]
        time_limit: Option<f64>,
        /// Override the configured number of search workers
        #[arg(long)]
        workers: Option<u32>,
    },
    /// Serve the HTTP solve endpoint
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

fn solve(
    config_path: PathBuf,
    signups: PathBuf,
    time_limit: Option<f64>,
    workers: Option<u32>,
) -> team_balancer::Result<()> {
    let mut config = RunConfig::load(&config_path)?;
    if let Some(secs) = time_limit {
        config.balance.time_limit_secs = secs;
    }
    if let Some(n) = workers {
        config.balance.workers = n;
    }
    info!("Loaded configuration from {}", config_path.display());

    let players = io::load_signups(&signups)?;
    let solution = balance(&players, &config.balance, &HighsSolver::default())?;
    let run_dir = io::write_run_outputs(&config, &signups, &players, &solution)?;

    io::write_console_summary(&mut std::io::stdout().lock(), &solution, &run_dir)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Solve {
            config,
            signups,
            time_limit,
            workers,
        } => tokio::task::block_in_place(|| solve(config, signups, time_limit, workers)),
        Command::Serve { addr } => server::run_server(&addr).await.map_err(Into::into),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
