use std::time::{Duration, Instant};

use riptide::board::Board;
use riptide::search::{is_mate_score, SearchLimits, Searcher, MATE_SCORE};

#[test]
fn finds_mate_in_one() {
    let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1").unwrap();
    let mut searcher = Searcher::default();
    let report = searcher.search(&mut board, &SearchLimits::depth(3));
    assert_eq!(report.best_move.map(|m| m.to_uci()), Some("d1d8".to_string()));
    assert!(is_mate_score(report.score), "score {} should be a mate score", report.score);
    assert_eq!(report.score, MATE_SCORE - 1);
}

#[test]
fn mated_position_scores_negative_mate() {
    // Black to move, already checkmated in the corner.
    let mut board = Board::from_fen("R6k/6pp/8/8/8/8/8/7K b - - 0 1").unwrap();
    let mut searcher = Searcher::default();
    let report = searcher.search(&mut board, &SearchLimits::depth(3));
    assert!(report.best_move.is_none());
    assert_eq!(report.score, -MATE_SCORE);
}

#[test]
fn stalemate_scores_draw() {
    let mut board = Board::from_fen("k7/8/1QK5/8/8/8/8/8 b - - 0 1").unwrap();
    let mut searcher = Searcher::default();
    let report = searcher.search(&mut board, &SearchLimits::depth(4));
    assert!(report.best_move.is_none());
    assert_eq!(report.score, 0);
}

#[test]
fn takes_the_hanging_queen() {
    let mut board = Board::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
    let mut searcher = Searcher::default();
    let report = searcher.search(&mut board, &SearchLimits::depth(4));
    assert_eq!(report.best_move.map(|m| m.to_uci()), Some("d1d5".to_string()));
    assert!(report.score > 400, "winning a queen should dominate, got {}", report.score);
}

#[test]
fn probing_and_legality_checks_leave_board_untouched() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let mut searcher = Searcher::default();
    searcher.search(&mut board, &SearchLimits::depth(4));

    let occupied = board.occupied();
    let empty = board.empty();
    let zobrist = board.zobrist();

    searcher.tt.probe(board.zobrist());
    board.generate_legal_moves();
    board.parse_move("e1g1").unwrap();
    board.parse_move("a1b1").unwrap();
    assert!(board.parse_move("e1e8").is_err());

    assert_eq!(board.occupied(), occupied);
    assert_eq!(board.empty(), empty);
    assert_eq!(board.zobrist(), zobrist);
    board.assert_consistent();
}

#[test]
fn root_entry_stored_exact_with_full_depth() {
    use riptide::search::tt::Bound;
    let mut board = Board::start_pos();
    let mut searcher = Searcher::default();
    searcher.search(&mut board, &SearchLimits::depth(4));
    let entry = searcher.tt.probe(board.zobrist()).expect("root entry stored");
    assert_eq!(entry.bound, Bound::Exact);
    assert!(entry.depth >= 4, "stored depth {} below search depth", entry.depth);
    assert!(entry.best.is_some());
}

#[test]
fn depth_cap_respected() {
    let mut board = Board::start_pos();
    let mut searcher = Searcher::default();
    let report = searcher.search(&mut board, &SearchLimits::depth(3));
    assert_eq!(report.depth, 3);
    assert!(report.best_move.is_some());
}

#[test]
fn movetime_returns_quickly_with_a_move() {
    let mut board = Board::start_pos();
    let mut searcher = Searcher::default();
    let t0 = Instant::now();
    let report = searcher.search(&mut board, &SearchLimits::movetime(10));
    let elapsed = t0.elapsed();
    assert!(report.best_move.is_some(), "no bestmove under movetime");
    assert!(elapsed < Duration::from_secs(1), "search overran its budget: {elapsed:?}");
    // Balanced makes and undos: the start position is intact.
    board.assert_consistent();
    assert_eq!(board.ply(), 0);
}

#[test]
fn node_cap_stops_the_search() {
    let mut board = Board::start_pos();
    let mut searcher = Searcher::default();
    let limits = SearchLimits { nodes: Some(5_000), ..SearchLimits::default() };
    let report = searcher.search(&mut board, &limits);
    // The stop is polled every 2048 nodes, so allow that much overshoot.
    assert!(report.nodes < 5_000 + 4_096, "searched {} nodes", report.nodes);
}

#[test]
fn search_is_repeatable_after_new_game() {
    let mut board = Board::start_pos();
    let mut searcher = Searcher::default();
    let first = searcher.search(&mut board, &SearchLimits::depth(4));
    searcher.new_game();
    let second = searcher.search(&mut board, &SearchLimits::depth(4));
    assert_eq!(first.best_move, second.best_move);
    assert_eq!(first.score, second.score);
}
