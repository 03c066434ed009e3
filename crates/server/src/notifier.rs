//! Outbound announcements of fight results.
//!
//! Notification is best effort: a failure here is logged by the caller and
//! never rolls back a stored result.

use anyhow::Result;
use serde::Serialize;

use spoodblort_engine::combat::FightState;
use spoodblort_engine::combat::commentary::format_number;
use spoodblort_engine::fight::Fight;
use spoodblort_engine::fighter::Fighter;

/// Everything an announcement needs about a finished fight.
#[derive(Debug, Clone, Serialize)]
pub struct FightReport {
    pub fight: Fight,
    pub state: FightState,
    pub fighter1: Option<Fighter>,
    pub fighter2: Option<Fighter>,
}

impl FightReport {
    /// One-line summary, e.g. `"Sampson def. Timber by knockout (41,200 - 0)"`.
    pub fn headline(&self) -> String {
        let name1 = self.fight.fighter1_name.as_str();
        let name2 = self.fight.fighter2_name.as_str();
        let scores = format!("({} - {})", format_number(self.state.health1), format_number(self.state.health2));
        let how = self
            .state
            .finish
            .map(|f| format!("{:?}", f).to_lowercase())
            .unwrap_or_else(|| "decision".to_string());
        match self.state.winner {
            Some(w) if w == self.fight.fighter1_id => format!("{} def. {} by {} {}", name1, name2, how, scores),
            Some(_) => format!("{} def. {} by {} {}", name2, name1, how, scores),
            None => format!("{} and {} fight to a draw {}", name1, name2, scores),
        }
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn fight_result(&self, report: &FightReport) -> Result<()>;

    /// Drop stale schedule announcements. Called on the closed day.
    fn clear_schedule_announcements(&self) -> Result<()> {
        Ok(())
    }
}

/// Writes announcements to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn fight_result(&self, report: &FightReport) -> Result<()> {
        tracing::info!(fight = %report.fight.id, "RESULT: {}", report.headline());
        Ok(())
    }

    fn clear_schedule_announcements(&self) -> Result<()> {
        tracing::info!("Closed day: clearing schedule announcements");
        Ok(())
    }
}
