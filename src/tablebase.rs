//! Endgame tablebase probing against the lichess API. Strictly an
//! external collaborator: every transport, decode or coverage failure
//! degrades to "no suggestion" and never aborts a search.

use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;

const TABLEBASE_URL: &str = "https://tablebase.lichess.ovh/standard";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Positions with more pieces than this are not covered.
pub const MAX_TABLEBASE_PIECES: u32 = 7;

#[derive(Debug, Clone, Deserialize)]
pub struct TablebaseMove {
    pub uci: String,
    pub san: String,
    #[serde(default)]
    pub dtz: Option<i32>,
    #[serde(default)]
    pub dtm: Option<i32>,
    #[serde(default)]
    pub wdl: Option<i32>,
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TablebaseResult {
    pub category: String,
    #[serde(default)]
    pub dtz: Option<i32>,
    #[serde(default)]
    pub dtm: Option<i32>,
    #[serde(default)]
    pub checkmate: bool,
    #[serde(default)]
    pub stalemate: bool,
    pub moves: Vec<TablebaseMove>,
}

/// Queries the tablebase for a FEN. `None` on any failure.
pub fn probe(fen: &str) -> Option<TablebaseResult> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| warn!("tablebase client: {e}"))
        .ok()?;
    let response = client
        .get(TABLEBASE_URL)
        .query(&[("fen", fen)])
        .send()
        .map_err(|e| warn!("tablebase request: {e}"))
        .ok()?;
    if !response.status().is_success() {
        warn!("tablebase returned status {}", response.status());
        return None;
    }
    response.json::<TablebaseResult>().map_err(|e| warn!("tablebase decode: {e}")).ok()
}

/// The tablebase's preferred move for the position, with its category.
/// The API sorts moves best-first for the side to move.
pub fn probe_best(fen: &str) -> Option<(String, String)> {
    let result = probe(fen)?;
    let best = result.moves.first()?;
    debug!("tablebase: {} is {} (position {})", best.uci, best.category, result.category);
    Some((best.uci.clone(), best.category.clone()))
}
