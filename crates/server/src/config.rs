//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use clap::Parser;

use spoodblort_engine::calendar::{Calendar, DEFAULT_MAX_WEEK, DEFAULT_UTC_OFFSET_MINUTES};

#[derive(Debug, Clone, Parser)]
#[command(name = "spoodblort", about = "Runs the weekly fight tournament and its live broadcasts")]
pub struct Config {
    /// Address for the spectator HTTP/websocket endpoint
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Snapshot file for fighters, tournaments and fights
    #[arg(long, default_value = "data/tournament.json")]
    pub data: PathBuf,

    /// Directory for per-fight play-by-play logs
    #[arg(long, default_value = "fight_logs")]
    pub fight_logs: PathBuf,

    /// Tournament local time, in minutes east of UTC
    #[arg(long, default_value_t = DEFAULT_UTC_OFFSET_MINUTES, allow_hyphen_values = true)]
    pub utc_offset_minutes: i32,

    /// Monday of week 1
    #[arg(long, default_value = "2025-07-21")]
    pub season_start: NaiveDate,

    /// Last tournament week
    #[arg(long, default_value_t = DEFAULT_MAX_WEEK)]
    pub max_week: u32,

    /// Seconds between schedule passes
    #[arg(long, default_value_t = 30)]
    pub schedule_interval_secs: u64,

    /// Seconds between snapshot autosaves
    #[arg(long, default_value_t = 300)]
    pub autosave_secs: u64,

    /// Populate an empty store with sample fighters and tournaments
    #[arg(long)]
    pub seed_demo: bool,

    /// Simulate one fight to stdout and exit
    #[arg(long)]
    pub demo: bool,
}

impl Config {
    pub fn calendar(&self) -> Result<Calendar> {
        Calendar::from_offset_minutes(self.utc_offset_minutes, self.season_start, self.max_week)
            .ok_or_else(|| anyhow!("UTC offset of {} minutes is out of range", self.utc_offset_minutes))
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs.max(1))
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_secs.max(1))
    }
}
