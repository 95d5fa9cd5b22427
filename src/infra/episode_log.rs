use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::{OffsetDateTime, format_description};
use tracing::warn;

use crate::runner::EpisodeSummary;
use crate::switch::{SwitchEnv, SwitchStep};

use super::episode_observer::EpisodeObserver;

/// Appends one JSON line per finished episode to a time-stamped file.
pub struct EpisodeLogObserver {
    path: PathBuf,
    file: File,
}

impl EpisodeLogObserver {
    pub fn new(log_folder: impl AsRef<Path>) -> io::Result<Self> {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let format = format_description::parse("[year][month][day]-[hour][minute][second]")
            .map_err(io::Error::other)?;
        let date_time_str = now.format(&format).map_err(io::Error::other)?;

        let path = log_folder
            .as_ref()
            .join(format!("episodes - {}.jsonl", date_time_str));

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, summary: &EpisodeSummary) -> io::Result<()> {
        let line = serde_json::to_string(summary)?;
        writeln!(self.file, "{}", line)?;
        self.file.flush()
    }
}

impl EpisodeObserver for EpisodeLogObserver {
    fn on_episode_start(&mut self, _episode: usize, _env: &SwitchEnv) {}

    fn on_step(&mut self, _episode: usize, _timestep: u64, _step: &SwitchStep, _env: &SwitchEnv) {}

    fn on_episode_end(&mut self, summary: &EpisodeSummary) {
        if let Err(err) = self.append(summary) {
            warn!("Failed to write episode {} to {:?}: {}", summary.episode, self.path, err);
        }
    }
}
