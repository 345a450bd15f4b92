use pretty_assertions::assert_eq;
use riptide::board::{sq, Board};

fn uci_moves(board: &mut Board) -> Vec<String> {
    let mut moves: Vec<String> =
        board.generate_legal_moves().iter().map(|m| m.to_uci()).collect();
    moves.sort();
    moves
}

fn sorted(mut moves: Vec<&str>) -> Vec<String> {
    moves.sort();
    moves.into_iter().map(str::to_string).collect()
}

#[test]
fn startpos_has_twenty_moves() {
    let mut board = Board::start_pos();
    assert_eq!(board.generate_legal_moves().len(), 20);
}

// The capturing pawn is pinned against its king along the fourth rank, so
// the en passant capture must disappear even though the square is set.
#[test]
fn en_passant_pseudo_pin() {
    let mut board =
        Board::from_fen("rnbq1bnr/ppp1pppp/8/8/k2p3R/8/PPPPPPPP/RNBQKBN1 w - - 0 1").unwrap();
    board.make_move_uci("e2e4").unwrap();
    assert_eq!(board.en_passant(), Some(sq::E3));
    assert!(!uci_moves(&mut board).contains(&"d4e3".to_string()));
}

#[test]
fn two_en_passant_options() {
    let mut board = Board::from_fen("7k/8/8/8/pPp5/8/8/7K b - b3 0 1").unwrap();
    assert_eq!(
        uci_moves(&mut board),
        sorted(vec!["a4a3", "c4c3", "a4b3", "c4b3", "h8h7", "h8g7", "h8g8"])
    );
}

#[test]
fn two_en_passant_options_one_pinned() {
    let mut board = Board::from_fen("8/8/4k3/8/2pPp3/8/B7/7K b - d3 0 1").unwrap();
    assert_eq!(
        uci_moves(&mut board),
        sorted(vec!["e4e3", "e4d3", "e6d5", "e6f5", "e6d6", "e6f6", "e6d7", "e6e7", "e6f7"])
    );
}

#[test]
fn locked_pawns_have_no_moves() {
    let mut board = Board::from_fen("8/4k3/1p1p1p1p/pPpPpPpP/P1P1P1P1/8/5K2/8 w - - 0 1").unwrap();
    assert_eq!(
        uci_moves(&mut board),
        sorted(vec!["f2e3", "f2f3", "f2g3", "f2e2", "f2g2", "f2e1", "f2f1", "f2g1"])
    );
}

#[test]
fn castling_blocked_by_attacked_transit_square() {
    let mut board =
        Board::from_fen("rnbq1rk1/pppp1ppp/5n2/2b1p3/2B1P3/5P2/PPPPN1PP/RNBQK2R w KQ - 5 5")
            .unwrap();
    assert!(!uci_moves(&mut board).contains(&"e1g1".to_string()));
}

#[test]
fn castling_through_empty_unattacked_squares() {
    let mut board =
        Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
    let moves = uci_moves(&mut board);
    assert!(moves.contains(&"e1g1".to_string()));
    assert!(moves.contains(&"e1c1".to_string()));
}

#[test]
fn complex_middlegame_exact_moves() {
    let mut board =
        Board::from_fen("r3r1k1/pp3pbp/1qp1b1p1/2B5/2BP4/Q1n2N2/P4PPP/3R1K1R w - - 4 18").unwrap();
    assert_eq!(
        uci_moves(&mut board),
        sorted(vec![
            "d1c1", "d1b1", "d1a1", "d1e1", "d1d2", "d1d3", "h1g1",
            "f1e1", "f1g1", "g2g3", "g2g4", "h2h3", "h2h4", "a3b2",
            "a3c1", "a3b3", "a3c3", "a3a4", "a3a5", "a3a6", "a3a7",
            "a3b4", "f3e1", "f3g1", "f3d2", "f3h4", "f3e5", "f3g5",
            "c4b3", "c4d3", "c4e2", "c4b5", "c4d5", "c4a6", "c4e6",
            "d4d5", "c5b4", "c5b6", "c5d6", "c5e7", "c5f8",
        ])
    );
}

// 218 legal moves, the known maximum-breadth constructed position.
#[test]
fn maximum_mobility_position() {
    let mut board =
        Board::from_fen("R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNN1KB1 w - - 0 1").unwrap();
    assert_eq!(board.generate_legal_moves().len(), 218);
}

#[test]
fn all_promotions_generated() {
    let mut board = Board::from_fen("3k4/8/1K6/8/8/8/pppppppp/RRRRRRRR b - - 0 1").unwrap();
    assert_eq!(
        uci_moves(&mut board),
        sorted(vec![
            "a2b1q", "a2b1r", "a2b1n", "a2b1b",
            "b2a1q", "b2a1r", "b2a1n", "b2a1b",
            "b2c1q", "b2c1r", "b2c1n", "b2c1b",
            "c2b1q", "c2b1r", "c2b1n", "c2b1b",
            "c2d1q", "c2d1r", "c2d1n", "c2d1b",
            "e2d1q", "e2d1r", "e2d1n", "e2d1b",
            "e2f1q", "e2f1r", "e2f1n", "e2f1b",
            "f2e1q", "f2e1r", "f2e1n", "f2e1b",
            "f2g1q", "f2g1r", "f2g1n", "f2g1b",
            "g2f1q", "g2f1r", "g2f1n", "g2f1b",
            "g2h1q", "g2h1r", "g2h1n", "g2h1b",
            "h2g1q", "h2g1r", "h2g1n", "h2g1b",
            "d8c8", "d8d7", "d8e7", "d8e8",
        ])
    );
}

#[test]
fn double_check_allows_only_king_moves() {
    // Knight on f6 and rook on e1 both give check.
    let mut board = Board::from_fen("4k3/8/5N2/8/8/8/8/4R1K1 b - - 0 1").unwrap();
    let moves = board.generate_legal_moves();
    assert!(!moves.is_empty());
    assert!(moves.iter().all(|m| m.from == sq::E8));
}

#[test]
fn single_check_capture_block_or_flee() {
    // Rook e1 checks the king; block with the bishop or rook, capture
    // nothing, or step aside.
    let mut board = Board::from_fen("3bk3/3r4/8/8/8/8/8/4R1K1 b - - 0 1").unwrap();
    let moves = uci_moves(&mut board);
    assert!(moves.contains(&"d8e7".to_string()), "bishop block");
    assert!(moves.contains(&"d7e7".to_string()), "rook block");
    assert!(moves.contains(&"e8f7".to_string()), "king steps aside");
    assert!(!moves.contains(&"d7d1".to_string()), "rook may not ignore the check");
}

#[test]
fn capture_generation_is_subset_of_legal() {
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "7k/8/8/8/pPp5/8/8/7K b - b3 0 1",
        "r3r1k1/pp3pbp/1qp1b1p1/2B5/2BP4/Q1n2N2/P4PPP/3R1K1R w - - 4 18",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    ];
    for fen in fens {
        let mut board = Board::from_fen(fen).unwrap();
        let legal = board.generate_legal_moves();
        let captures = board.generate_captures();
        for c in &captures {
            assert!(legal.contains(c), "capture {} not in legal list ({fen})", c.to_uci());
        }
        // No capture may be missing from the capture-only mode.
        for m in legal.iter().filter(|m| m.is_capture()) {
            assert!(captures.contains(m), "capture {} missing ({fen})", m.to_uci());
        }
    }
}
