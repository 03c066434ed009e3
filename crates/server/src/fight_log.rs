//! Plain-text play-by-play written while a fight runs.
//!
//! A [`FightLog`] is owned by the task driving the fight and consumed by
//! [`FightLog::finish`], so the file is closed exactly once.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use spoodblort_engine::combat::{FightState, Finish, LiveAction};
use spoodblort_engine::fight::{Fight, Tournament};

pub struct FightLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FightLog {
    /// Create the log file for `fight` under `dir` and write its header.
    pub fn create(dir: &Path, fight: &Fight, tournament: Option<&Tournament>) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(file_name(fight));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        let mut log = Self { path, writer: BufWriter::new(file) };

        log.line(&format!("{} vs {}", fight.fighter1_name, fight.fighter2_name))?;
        if let Some(t) = tournament {
            log.line(&format!("{}, Sponsored by {}", t.name, t.sponsor))?;
        }
        log.line("")?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{}", text)
            .and_then(|_| self.writer.flush())
            .with_context(|| format!("writing {}", self.path.display()))
    }

    pub fn action(&mut self, action: &LiveAction) -> Result<()> {
        for line in action.log_lines() {
            self.line(&line)?;
        }
        Ok(())
    }

    /// Write the closing result line and close the file.
    pub fn finish(mut self, result_line: &str) -> Result<PathBuf> {
        self.line("")?;
        self.line(result_line)?;
        let Self { path, writer } = self;
        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("closing {}", path.display()))?;
        Ok(path)
    }
}

/// `YYYY-MM-DD-Fight{id}-{name1}-vs-{name2}.txt`, dated by the scheduled day.
pub fn file_name(fight: &Fight) -> String {
    format!(
        "{}-Fight{}-{}-vs-{}.txt",
        fight.scheduled_at.format("%Y-%m-%d"),
        fight.id,
        sanitize_name(&fight.fighter1_name),
        sanitize_name(&fight.fighter2_name)
    )
}

/// Keep ASCII alphanumerics; spaces and underscores become `-`, anything
/// else (dashes included) is dropped.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            ' ' | '_' => Some('-'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        })
        .collect()
}

/// The closing line for a finished fight.
pub fn result_line(fight: &Fight, state: &FightState) -> String {
    let Some(winner) = state.winner.and_then(|w| fight.name_of(w)) else {
        return "Fight ends in a draw!".to_string();
    };
    match state.finish {
        Some(Finish::Death) => format!("{} wins by DEATH!", winner),
        Some(Finish::Knockout) => format!("{} wins by KO!", winner),
        _ => format!("{} wins by decision!", winner),
    }
}
