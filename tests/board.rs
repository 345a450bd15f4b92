use riptide::board::{sq, Board, Color, Piece, PieceType};
use riptide::board::position::START_FEN;

fn snapshot(board: &Board) -> (String, u64) {
    (board.to_fen(), board.zobrist())
}

#[test]
fn startpos_defaults() {
    let board = Board::start_pos();
    let rights = board.castling();
    assert!(rights.wk && rights.wq && rights.bk && rights.bq);
    assert_eq!(board.en_passant(), None);
    assert_eq!(board.turn(), Color::White);
    assert_eq!(board.occupied().count_ones(), 32);
    board.assert_consistent();
}

#[test]
fn fen_parser_matches_hardcoded_startpos() {
    let parsed = Board::from_fen(START_FEN).unwrap();
    let built = Board::start_pos();
    assert_eq!(parsed.to_fen(), built.to_fen());
    assert_eq!(parsed.zobrist(), built.zobrist());
    assert_eq!(parsed.occupied(), built.occupied());
    assert_eq!(parsed.empty(), built.empty());
}

#[test]
fn fen_round_trip() {
    let fens = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "7k/8/8/8/pPp5/8/8/7K b - b3 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    ];
    for fen in fens {
        let board = Board::from_fen(fen).unwrap();
        assert_eq!(board.to_fen(), fen);
        board.assert_consistent();
    }
}

#[test]
fn malformed_fen_is_rejected() {
    assert!(Board::from_fen("").is_err());
    assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8").is_err());
    // Wrong rank width.
    assert!(Board::from_fen("rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
    // Unknown piece letter.
    assert!(Board::from_fen("rnbqxbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
    // No king.
    assert!(Board::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    // Bad side to move and bad en passant square.
    assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
    assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e9 0 1").is_err());
}

#[test]
fn illegal_move_string_leaves_board_unchanged() {
    let mut board = Board::start_pos();
    let before = snapshot(&board);
    assert!(board.make_move_uci("e2e5").is_err());
    assert!(board.make_move_uci("zz99").is_err());
    assert!(board.make_move_uci("e7e5").is_err());
    assert_eq!(snapshot(&board), before);
}

#[test]
fn make_undo_restores_every_field() {
    let fens = [
        START_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        "7k/8/8/8/pPp5/8/8/7K b - b3 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    ];
    for fen in fens {
        let mut board = Board::from_fen(fen).unwrap();
        let before = snapshot(&board);
        for mv in board.generate_legal_moves() {
            board.make_move(mv);
            board.assert_consistent();
            board.undo();
            board.assert_consistent();
            assert_eq!(snapshot(&board), before, "round trip failed for {}", mv.to_uci());
        }
    }
}

#[test]
fn promotion_make_and_undo() {
    let mut board = Board::from_fen("3k4/8/1K6/8/8/8/pppppppp/RRRRRRRR b - - 0 1").unwrap();
    let before = snapshot(&board);

    board.make_move_uci("b2a1q").unwrap();
    assert_eq!(board.piece_on(sq::A1), Some(Piece::new(Color::Black, PieceType::Queen)));
    assert_eq!(board.piece_on(sq::B2), None);
    assert_eq!(board.ply(), 1);
    board.assert_consistent();

    board.undo();
    assert_eq!(board.piece_on(sq::A1), Some(Piece::new(Color::White, PieceType::Rook)));
    assert_eq!(board.piece_on(sq::B2), Some(Piece::new(Color::Black, PieceType::Pawn)));
    assert_eq!(board.ply(), 0);
    assert_eq!(snapshot(&board), before);
}

#[test]
fn en_passant_make_and_undo() {
    let mut board = Board::from_fen("7k/8/8/8/pPp5/8/8/7K b - b3 0 1").unwrap();
    let before = snapshot(&board);

    board.make_move_uci("a4b3").unwrap();
    assert_eq!(board.piece_on(sq::B3), Some(Piece::new(Color::Black, PieceType::Pawn)));
    assert_eq!(board.piece_on(sq::B4), None, "captured pawn is on the passed-through square");
    board.assert_consistent();

    board.undo();
    assert_eq!(board.piece_on(sq::B3), None);
    assert_eq!(board.piece_on(sq::B4), Some(Piece::new(Color::White, PieceType::Pawn)));
    assert_eq!(board.piece_on(sq::A4), Some(Piece::new(Color::Black, PieceType::Pawn)));
    assert_eq!(snapshot(&board), before);
}

#[test]
fn castling_make_and_undo() {
    let mut board =
        Board::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
    let before = snapshot(&board);

    board.make_move_uci("e1g1").unwrap();
    assert_eq!(board.piece_on(sq::G1), Some(Piece::new(Color::White, PieceType::King)));
    assert_eq!(board.piece_on(sq::F1), Some(Piece::new(Color::White, PieceType::Rook)));
    assert_eq!(board.piece_on(sq::H1), None);
    assert!(!board.castling().wk && !board.castling().wq);
    board.assert_consistent();

    board.undo();
    assert_eq!(snapshot(&board), before);

    board.make_move_uci("e1c1").unwrap();
    assert_eq!(board.piece_on(sq::C1), Some(Piece::new(Color::White, PieceType::King)));
    assert_eq!(board.piece_on(sq::D1), Some(Piece::new(Color::White, PieceType::Rook)));
    board.undo();
    assert_eq!(snapshot(&board), before);
}

#[test]
fn capture_undo_restores_victim() {
    let mut board =
        Board::from_fen("r3r1k1/pp3pbp/1qp1b1p1/2B5/2BP4/Q1n2N2/P4PPP/3R1K1R w - - 4 18").unwrap();
    let before = snapshot(&board);
    board.make_move_uci("c4e6").unwrap();
    board.undo();
    assert_eq!(board.piece_on(sq::E6), Some(Piece::new(Color::Black, PieceType::Bishop)));
    assert_eq!(board.piece_on(sq::C4), Some(Piece::new(Color::White, PieceType::Bishop)));
    assert_eq!(snapshot(&board), before);
}

#[test]
fn rook_capture_revokes_castling_rights() {
    let mut board =
        Board::from_fen("r3k2r/8/8/8/8/8/6P1/R3K2R w KQkq - 0 1").unwrap();
    // A rook trade on h8 strips black's kingside right.
    board.make_move_uci("h1h8").unwrap();
    assert!(!board.castling().bk);
    assert!(board.castling().bq);
    assert!(!board.castling().wk, "white's h-rook left home too");
    board.undo();
    let rights = board.castling();
    assert!(rights.wk && rights.wq && rights.bk && rights.bq);
}

#[test]
fn double_push_sets_en_passant_square() {
    let mut board = Board::start_pos();
    board.make_move_uci("e2e4").unwrap();
    assert_eq!(board.en_passant(), Some(sq::E3));
    board.make_move_uci("g8f6").unwrap();
    assert_eq!(board.en_passant(), None, "en passant expires after one ply");
}

#[test]
fn threefold_repetition_detected() {
    let mut board = Board::start_pos();
    for mv in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        assert!(!board.is_threefold());
        board.make_move_uci(mv).unwrap();
    }
    assert!(board.is_threefold());
}

#[test]
fn null_move_round_trip() {
    let mut board = Board::from_fen("7k/8/8/8/pPp5/8/8/7K b - b3 0 1").unwrap();
    let before = snapshot(&board);
    board.make_null_move();
    assert_eq!(board.turn(), Color::White);
    assert_eq!(board.en_passant(), None);
    board.undo();
    assert_eq!(board.turn(), Color::Black);
    assert_eq!(snapshot(&board), before);
}

#[test]
fn insufficient_material() {
    assert!(Board::from_fen("k7/8/8/8/8/8/8/7K w - - 0 1").unwrap().is_insufficient_material());
    assert!(Board::from_fen("k7/8/8/8/8/8/8/6BK w - - 0 1").unwrap().is_insufficient_material());
    assert!(!Board::from_fen("k7/7p/8/8/8/8/8/6BK w - - 0 1").unwrap().is_insufficient_material());
    assert!(!Board::from_fen("kb6/8/8/8/8/8/8/6BK w - - 0 1").unwrap().is_insufficient_material());
}
