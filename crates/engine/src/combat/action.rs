use serde::{Deserialize, Serialize};

use super::tick::Frenzy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Damage,
    Critical,
    LowHealth,
    ComebackCrit,
    Death,
    Knockout,
    Round,
}

/// A purely descriptive fight event for spectators and the fight log.
///
/// Nothing in the simulator reads these back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub action: String,
    pub damage: i32,
    pub attacker: String,
    pub victim: String,
    pub commentary: String,
    pub announcer: String,
    pub health1: i32,
    pub health2: i32,
    pub round: u32,
    pub tick_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frenzy1: Option<Frenzy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frenzy2: Option<Frenzy>,
}

impl LiveAction {
    /// Lines this event contributes to a fight log: the action itself and,
    /// when present, the announcer's remark.
    pub fn log_lines(&self) -> Vec<String> {
        let mut lines = vec![self.action.clone()];
        if !self.commentary.is_empty() {
            lines.push(format!("{}: \"{}\"", self.announcer, self.commentary));
        }
        lines
    }
}
