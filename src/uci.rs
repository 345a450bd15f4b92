//! UCI command loop. Glue around the core: parses protocol commands,
//! keeps the long-lived searcher state, and dispatches search requests
//! synchronously on the command thread.

use std::io::{self, BufRead};
use std::sync::Arc;

use log::{info, warn};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::board::Board;
use crate::book::OpeningBook;
use crate::eval::{self, Nnue};
use crate::search::{SearchLimits, Searcher};
use crate::tablebase;

pub struct UciEngine {
    board: Board,
    searcher: Searcher,
    book: OpeningBook,
    rng: SmallRng,
    use_book: bool,
    use_tablebase: bool,
}

impl UciEngine {
    pub fn new(hash_mb: usize, net: Option<Arc<Nnue>>) -> UciEngine {
        let mut engine = UciEngine {
            board: Board::start_pos(),
            searcher: Searcher::new(hash_mb),
            book: OpeningBook::new(),
            rng: SmallRng::from_entropy(),
            use_book: false,
            use_tablebase: false,
        };
        engine.searcher.report_info = true;
        if let Some(net) = net {
            engine.attach_evaluator(net);
        }
        engine
    }

    fn attach_evaluator(&mut self, net: Arc<Nnue>) {
        self.board.set_evaluator(net.clone());
        self.searcher.set_evaluator(net);
    }

    fn cmd_uci(&self) {
        println!("id name riptide {}", env!("CARGO_PKG_VERSION"));
        println!("id author riptide developers");
        println!("option name Hash type spin default 256 min 1 max 4096");
        println!("option name EvalFile type string default network.bin");
        println!("option name OwnBook type check default false");
        println!("option name UseTablebase type check default false");
        println!("uciok");
    }

    fn cmd_ucinewgame(&mut self) {
        self.board = Board::start_pos();
        if let Some(net) = self.searcher.evaluator().cloned() {
            self.board.set_evaluator(net);
        }
        self.searcher.new_game();
    }

    fn cmd_position(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        let (mut board, move_start) = if tokens.first() == Some(&"fen") {
            if tokens.len() < 7 {
                warn!("position: truncated fen");
                return;
            }
            let fen = tokens[1..7].join(" ");
            match Board::from_fen(&fen) {
                Ok(b) => (b, 7),
                Err(e) => {
                    warn!("position: {e}");
                    return;
                }
            }
        } else {
            (Board::start_pos(), 1)
        };

        if let Some(net) = self.searcher.evaluator().cloned() {
            board.set_evaluator(net);
        }

        let mut moves = &tokens[move_start.min(tokens.len())..];
        if moves.first() == Some(&"moves") {
            moves = &moves[1..];
        }
        for mv in moves {
            if let Err(e) = board.make_move_uci(mv) {
                warn!("position: {e}");
                return;
            }
        }
        self.board = board;
    }

    fn parse_go(args: &str) -> SearchLimits {
        let mut limits = SearchLimits::default();
        let mut tokens = args.split_whitespace();
        while let Some(tok) = tokens.next() {
            let mut next_u64 = || tokens.next().and_then(|s| s.parse::<u64>().ok());
            match tok {
                "infinite" => limits.infinite = true,
                "depth" => limits.depth = next_u64().map(|d| d as i32),
                "nodes" => limits.nodes = next_u64(),
                "movetime" => limits.movetime = next_u64(),
                "wtime" => limits.wtime = next_u64(),
                "btime" => limits.btime = next_u64(),
                "winc" => limits.winc = next_u64(),
                "binc" => limits.binc = next_u64(),
                "movestogo" => limits.moves_to_go = next_u64(),
                _ => {}
            }
        }
        limits
    }

    fn cmd_go(&mut self, args: &str) {
        if self.use_book {
            if let Some(entry) = self.book.probe(self.board.zobrist(), &mut self.rng) {
                let mv = entry.mv.clone();
                // Played without further validation; provenance is the
                // book's problem, legality was checked when it was built.
                println!("bestmove {mv}");
                return;
            }
        }
        if self.use_tablebase
            && self.board.occupied().count_ones() <= tablebase::MAX_TABLEBASE_PIECES
        {
            if let Some((mv, category)) = tablebase::probe_best(&self.board.to_fen()) {
                info!("tablebase suggests {mv} ({category})");
                println!("bestmove {mv}");
                return;
            }
            // Probe failed: fall through to a normal search.
        }

        let mut limits = Self::parse_go(args);
        // A bare `go` with neither clock nor caps would otherwise search
        // to the ply ceiling; give it a sane fixed depth instead.
        let unbounded = !limits.infinite
            && limits.wtime.is_none()
            && limits.btime.is_none()
            && limits.depth.is_none()
            && limits.nodes.is_none()
            && limits.movetime.is_none();
        if unbounded {
            limits.depth = Some(12);
        }
        let report = self.searcher.search(&mut self.board, &limits);
        match report.best_move {
            Some(mv) => println!("bestmove {}", mv.to_uci()),
            None => println!("bestmove 0000"),
        }
    }

    fn cmd_setoption(&mut self, args: &str) {
        let tokens: Vec<&str> = args.split_whitespace().collect();
        let (Some(name_at), Some(value_at)) = (
            tokens.iter().position(|t| *t == "name").map(|i| i + 1),
            tokens.iter().position(|t| *t == "value").map(|i| i + 1),
        ) else {
            return;
        };
        let name = tokens.get(name_at).copied().unwrap_or_default();
        let value = tokens[value_at..].join(" ");
        match name {
            "Hash" => {
                if let Ok(mb) = value.parse::<usize>() {
                    self.searcher.tt = crate::search::tt::Tt::with_capacity_mb(mb);
                }
            }
            "EvalFile" => match Nnue::load(&value) {
                Ok(net) => self.attach_evaluator(Arc::new(net)),
                Err(e) => warn!("setoption EvalFile: {e:#}"),
            },
            "OwnBook" => self.use_book = value == "true",
            "UseTablebase" => self.use_tablebase = value == "true",
            _ => {}
        }
    }

    pub fn run_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(s) => s.trim().to_string(),
                Err(_) => break,
            };
            if line.is_empty() {
                continue;
            }
            match line.as_str() {
                "uci" => self.cmd_uci(),
                "isready" => println!("readyok"),
                "ucinewgame" => self.cmd_ucinewgame(),
                "quit" => break,
                // Searches run synchronously, so a stop can only arrive
                // between commands where there is nothing to interrupt.
                "stop" => self.searcher.timeman.request_stop(),
                "d" => print!("{}", self.board),
                "eval" => {
                    let net = self.searcher.evaluator().map(Arc::as_ref);
                    println!("{}", eval::evaluate(&self.board, net));
                }
                _ => {
                    if let Some(rest) = line.strip_prefix("position ") {
                        self.cmd_position(rest);
                    } else if let Some(rest) = line.strip_prefix("setoption ") {
                        self.cmd_setoption(rest);
                    } else if line == "go" {
                        self.cmd_go("");
                    } else if let Some(rest) = line.strip_prefix("go ") {
                        self.cmd_go(rest);
                    }
                }
            }
        }
    }
}
