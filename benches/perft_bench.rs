use criterion::{black_box, criterion_group, criterion_main, Criterion};

use riptide::board::Board;
use riptide::perft::perft;

fn perft_startpos(c: &mut Criterion) {
    c.bench_function("perft startpos d4", |b| {
        let mut board = Board::start_pos();
        b.iter(|| black_box(perft(&mut board, 4)));
    });
}

fn perft_kiwipete(c: &mut Criterion) {
    c.bench_function("perft kiwipete d3", |b| {
        let mut board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        b.iter(|| black_box(perft(&mut board, 3)));
    });
}

criterion_group!(benches, perft_startpos, perft_kiwipete);
criterion_main!(benches);
