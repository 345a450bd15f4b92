use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use riptide::board::{attacks, Board};
use riptide::eval::Nnue;
use riptide::perft;
use riptide::search::{SearchLimits, Searcher};
use riptide::uci::UciEngine;

const DEFAULT_EVAL_FILE: &str = "network.bin";

#[derive(Parser, Debug)]
#[command(version, about = "riptide - a UCI chess engine", long_about = None)]
struct Args {
    /// Path to the NNUE weight file; falls back to the classical
    /// evaluation when absent
    #[arg(long)]
    nnue: Option<PathBuf>,

    /// Transposition table size in megabytes
    #[arg(long, default_value_t = 256)]
    hash: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the UCI command loop (the default)
    Uci,
    /// Count leaf nodes of the legal move tree
    Perft {
        #[arg(long, default_value = "startpos")]
        fen: String,
        #[arg(long, default_value_t = 5)]
        depth: i32,
        /// Print the per-root-move breakdown
        #[arg(long)]
        divide: bool,
    },
    /// Fixed-depth search of a single position
    Search {
        #[arg(long, default_value = "startpos")]
        fen: String,
        #[arg(long, default_value_t = 8)]
        depth: i32,
    },
}

fn load_network(path: Option<&PathBuf>) -> Result<Option<Arc<Nnue>>> {
    match path {
        // An explicitly requested file must load or we refuse to start.
        Some(path) => {
            let net = Nnue::load(path).context("loading requested network")?;
            info!("loaded network from {}", path.display());
            Ok(Some(Arc::new(net)))
        }
        None => {
            if std::path::Path::new(DEFAULT_EVAL_FILE).exists() {
                let net = Nnue::load(DEFAULT_EVAL_FILE).context("loading default network")?;
                info!("loaded network from {DEFAULT_EVAL_FILE}");
                Ok(Some(Arc::new(net)))
            } else {
                info!("no network file found, using classical evaluation");
                Ok(None)
            }
        }
    }
}

fn board_from(fen: &str) -> Result<Board> {
    if fen == "startpos" {
        Ok(Board::start_pos())
    } else {
        Board::from_fen(fen).context("parsing --fen")
    }
}

fn main() -> Result<()> {
    env_logger::init();
    attacks::init();

    let args = Args::parse();
    let net = load_network(args.nnue.as_ref())?;

    match args.command.unwrap_or(Command::Uci) {
        Command::Uci => {
            UciEngine::new(args.hash, net).run_loop();
        }
        Command::Perft { fen, depth, divide } => {
            let mut board = board_from(&fen)?;
            if divide {
                let nodes = perft::divide(&mut board, depth);
                println!("total: {nodes} nodes");
            } else {
                for d in 1..=depth {
                    let start = std::time::Instant::now();
                    let nodes = perft::perft(&mut board, d);
                    println!("depth {d}: {nodes} nodes in {:?}", start.elapsed());
                }
            }
        }
        Command::Search { fen, depth } => {
            let mut board = board_from(&fen)?;
            let mut searcher = Searcher::new(args.hash);
            searcher.report_info = true;
            if let Some(net) = net {
                board.set_evaluator(net.clone());
                searcher.set_evaluator(net);
            }
            let report = searcher.search(&mut board, &SearchLimits::depth(depth));
            match report.best_move {
                Some(mv) => println!("bestmove {}", mv.to_uci()),
                None => println!("bestmove 0000"),
            }
        }
    }
    Ok(())
}
