use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use polars::prelude::DataFrame;

use crate::frames::{drain_to_dataframes, save_parquet};
use crate::subscriber::{clear, install_subscriber};

/// `YYYYMMDD-HHMM` in UTC.
fn run_stamp(now: SystemTime) -> String {
    let secs = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let minute_of_day = (secs % 86_400) / 60;
    format!(
        "{year:04}{month:02}{day:02}-{:02}{:02}",
        minute_of_day / 60,
        minute_of_day % 60
    )
}

/// Proleptic Gregorian date of a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Lowercase, `-` for anything but ASCII alphanumerics, at most 48 chars.
fn slug(name: &str) -> String {
    name.chars()
        .take(48)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Records one simulation run and persists it as parquet when dropped.
///
/// Creation clears this thread's recorder and installs the global
/// subscriber. Frames land in `{parent}/{stamp}_{name}/`, followed by an
/// empty `_ready` marker once every table is written.
pub struct ScopedRecorder {
    run_dir: PathBuf,
    frames: Option<HashMap<String, DataFrame>>,
}

impl ScopedRecorder {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        let run_dir = parent
            .into()
            .join(format!("{}_{}", run_stamp(SystemTime::now()), slug(name)));
        clear();
        install_subscriber();
        Self {
            run_dir,
            frames: None,
        }
    }

    /// Frames recorded so far. The first call drains the recorder; later
    /// calls return the same frames.
    pub fn get(&mut self) -> &HashMap<String, DataFrame> {
        self.frames.get_or_insert_with(|| {
            drain_to_dataframes().unwrap_or_else(|e| {
                eprintln!("ScopedRecorder: could not build frames: {e}");
                HashMap::new()
            })
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

impl Drop for ScopedRecorder {
    fn drop(&mut self) {
        let mut frames = match self.frames.take() {
            Some(frames) => frames,
            None => match drain_to_dataframes() {
                Ok(frames) => frames,
                Err(e) => {
                    eprintln!("ScopedRecorder: could not build frames: {e}");
                    return;
                }
            },
        };
        if frames.is_empty() {
            return;
        }
        if let Err(e) = save_parquet(&mut frames, &self.run_dir) {
            eprintln!("ScopedRecorder: failed to write {}: {e}", self.run_dir.display());
            return;
        }
        match std::fs::File::create(self.run_dir.join("_ready")) {
            Ok(_) => eprintln!(
                "ScopedRecorder: wrote {} tables to {}",
                frames.len(),
                self.run_dir.display()
            ),
            Err(e) => eprintln!("ScopedRecorder: failed to mark run ready: {e}"),
        }
    }
}
