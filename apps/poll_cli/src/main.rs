use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use poll_client::{
    JsonRpcLedger, Notifier, PollActionError, PollLedger, PollViewController, WalletSession,
};
use shared::domain::TxHash;
use tracing::info;

mod config;
mod render;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "movie-poll", about = "Propose movies, vote, and follow a movie poll")]
struct Cli {
    #[arg(long, default_value = "poll.toml")]
    config: PathBuf,
    #[arg(long)]
    rpc_url: Option<String>,
    #[arg(long)]
    contract: Option<String>,
    /// Sending account; defaults to the first account the node reports.
    #[arg(long)]
    account: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show poll status, timer and tallies.
    Status,
    /// Start a poll over the given movies.
    Start {
        #[arg(long = "movie", required = true)]
        movies: Vec<String>,
        /// Poll length in minutes.
        #[arg(long, default_value = "60", allow_hyphen_values = true)]
        duration: String,
    },
    /// Vote for a movie, or change an existing vote.
    Vote { movie: String },
    /// End the poll once its time is up.
    End,
    /// Show the contract owner, current poll record and sending account.
    Info,
}

/// Alerts go straight to the terminal.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        eprintln!("alert: {message}");
    }
}

fn report(outcome: std::result::Result<TxHash, PollActionError>) -> Result<()> {
    match outcome {
        Ok(tx) => {
            println!("submitted transaction {tx}");
            Ok(())
        }
        Err(PollActionError::Submission { action, .. }) => {
            Err(anyhow!("{action} transaction was not submitted"))
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(&cli.config)?;
    if let Some(v) = cli.rpc_url {
        settings.rpc_url = v;
    }
    if let Some(v) = cli.contract {
        settings.contract_address = v;
    }
    if cli.account.is_some() {
        settings.account = cli.account;
    }

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let ledger = Arc::new(JsonRpcLedger::connect(settings.ledger_config()?).await?);
    let mut controller =
        PollViewController::new(ledger.clone(), ledger.clone(), Arc::new(TerminalNotifier));
    controller.refresh().await;

    match cli.command {
        Command::Status => {}
        Command::Start { movies, duration } => {
            for movie in &movies {
                controller.add_candidate(movie);
            }
            let minutes = controller.set_duration(&duration);
            info!(
                "cli: starting poll movies={} duration_minutes={minutes}",
                controller.candidates().len()
            );
            report(controller.start_poll().await)?;
        }
        Command::Vote { movie } => {
            if let Some(movies) = controller.movies() {
                if !movies.iter().any(|m| m == &movie) {
                    bail!("'{movie}' is not in this poll; choose one of: {}", movies.join(", "));
                }
            }
            controller.select(movie);
            report(controller.vote_or_change().await)?;
        }
        Command::End => {
            report(controller.end_poll().await)?;
        }
        Command::Info => {
            match ledger.owner().await {
                Ok(owner) if owner.is_zero() => println!("owner: none"),
                Ok(owner) => println!("owner: {owner}"),
                Err(err) => println!("owner: unavailable ({err:#})"),
            }
            match ledger.current_poll().await {
                Ok(poll) => {
                    let end_time = poll
                        .end_time
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "not set".to_string());
                    println!("current poll: status={} end_time={end_time}", poll.status.label());
                    if !poll.winner.is_empty() {
                        println!("winner: {}", poll.winner);
                    }
                }
                Err(err) => println!("current poll: unavailable ({err:#})"),
            }
            match ledger.address() {
                Some(account) => println!("account: {account}"),
                None => println!("account: none (read-only)"),
            }
            return Ok(());
        }
    }

    print!("{}", render::render(&controller.view()));
    Ok(())
}
