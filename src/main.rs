use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commodity_board::{config, session, BoardCommand, IdSequence, OrderBoard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc::{channel, Sender};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "commodity_board", about = "Live order board for a commodity traded by weight")]
struct Cli {
    #[arg(short, long, default_value = "commodity_board.toml")]
    config_path: PathBuf,

    /// Print the live board as JSON rows instead of text lines
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines command script against an empty board
    Replay { script: PathBuf },
    /// Feed the board with random commands
    Demo {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Configured level as the default, refined by `RUST_LOG` style directives.
fn log_filter(level: LevelFilter, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives)
}

fn init_logging(cfg: &config::AppConfig) {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let filter = log_filter(cfg.logger.level.into(), &directives);
    match cfg.logger.format {
        config::LogFormat::JSON => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_current_span(true)
                .with_writer(std::io::stderr)
                .init();
        }
        config::LogFormat::COMPACT => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn feed_script(tx: Sender<BoardCommand>, commands: Vec<BoardCommand>) {
    for command in commands {
        if tx.send(command).await.is_err() {
            warn!("Board task stopped before the script finished");
            break;
        }
    }
}

async fn feed_random(tx: Sender<BoardCommand>, count: usize, seed: Option<u64>, first_id: u64) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    // Ids the board will hand out mirror the adds sent so far
    let mut known_ids = Vec::new();
    let mut next_id = first_id;

    for _ in 0..count {
        let command = BoardCommand::sample(&mut rng, &known_ids);
        match &command {
            BoardCommand::Add { .. } => {
                known_ids.push(next_id);
                next_id += 1;
            }
            BoardCommand::Cancel { order_id } => known_ids.retain(|id| id != order_id),
            BoardCommand::Reprice { .. } => {}
        }
        if tx.send(command).await.is_err() {
            warn!("Board task stopped before the demo feed finished");
            break;
        }
    }
}

fn print_board(board: &OrderBoard, json: bool) -> Result<()> {
    if json {
        let rows = serde_json::to_string_pretty(&board.live_rows())
            .context("Failed to render live board")?;
        println!("{rows}");
    } else {
        for line in board.display_live_board() {
            println!("{line}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::AppConfig::load(&cli.config_path).context("could not load config")?;

    init_logging(&config);

    info!("Starting order board for {}", config.board.commodity);
    let (tx, rx) = channel::<BoardCommand>(config.board.channel_capacity.max(1));
    let ids = IdSequence::starting_at(config.board.first_order_id);

    let board = match cli.command {
        Commands::Replay { script } => {
            let commands = session::read_commands(&script).await?;
            info!("Replaying {} commands from {}", commands.len(), script.display());
            let ((), board) = tokio::join!(feed_script(tx, commands), session::drive(rx, ids));
            board
        }
        Commands::Demo { count, seed } => {
            let count = count.unwrap_or(config.board.demo_commands);
            info!("Generating {} random commands", count);
            let ((), board) = tokio::join!(
                feed_random(tx, count, seed, config.board.first_order_id),
                session::drive(rx, ids)
            );
            board
        }
    };

    info!(
        "{} orders live across {} sell and {} buy levels",
        board.len(),
        board.sell_levels().len(),
        board.buy_levels().len()
    );
    print_board(&board, cli.json)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_configured_level() {
        let filter = log_filter(LevelFilter::WARN, "");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_log_filter_directives_override_level() {
        let filter = log_filter(LevelFilter::WARN, "commodity_board=trace");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }
}
