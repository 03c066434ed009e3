//! The broadcasting capability the live loop talks to.
//!
//! Messages are JSON objects tagged by `"type"`, serialized once and shared
//! with every subscriber as `Arc<str>`.

use std::sync::Arc;

use serde::Serialize;

use spoodblort_engine::combat::LiveAction;
use spoodblort_engine::fight::FightId;

/// Claps tallied over one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClapTotals {
    pub round: u32,
    pub total: u32,
    /// Distinct spectators that clapped at least once.
    pub spectators: u32,
}

pub trait Broadcaster: Send + Sync + 'static {
    fn broadcast_action(&self, fight: FightId, action: &LiveAction);
    fn broadcast_viewer_count(&self, fight: FightId);
    fn round_clap_totals(&self, fight: FightId, round: u32) -> ClapTotals;
    fn reset_round_claps(&self, fight: FightId, round: u32);
    fn broadcast_clap_summary(&self, fight: FightId, totals: &ClapTotals);
    /// Drop every clap tally kept for `fight` once its live run is over.
    fn clear_claps(&self, fight: FightId);
}

/// `{"type": "action", "data": ...}`
pub fn action_message(action: &LiveAction) -> Arc<str> {
    serde_json::json!({ "type": "action", "data": action }).to_string().into()
}

/// `{"type": "viewer_count", "count": n}`
pub fn viewer_count_message(count: usize) -> Arc<str> {
    serde_json::json!({ "type": "viewer_count", "count": count }).to_string().into()
}

/// `{"type": "clap_summary", "round": r, "total": n, "spectators": k}`
pub fn clap_summary_message(totals: &ClapTotals) -> Arc<str> {
    serde_json::json!({
        "type": "clap_summary",
        "round": totals.round,
        "total": totals.total,
        "spectators": totals.spectators,
    })
    .to_string()
    .into()
}

/// `{"type": "snapshot", "data": ...}`
pub fn snapshot_message<T: Serialize>(snapshot: &T) -> Arc<str> {
    serde_json::json!({ "type": "snapshot", "data": snapshot }).to_string().into()
}
