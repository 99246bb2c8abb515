//! Run progress and plan preview reporting.
//!
//! Reports observable progress while a merge run loads tags, plans merges,
//! and applies them, so the host (or a human) can see how far along a run
//! is. Events are emitted on **stderr** so stdout remains parseable for the
//! final result.
//!
//! Overall progress is split into fixed bands:
//!
//! | Phase | Range |
//! |-------|-------|
//! | loading tags | 0–60% |
//! | planning merges | 65% |
//! | merging tags | 70–100% |

use serde::Serialize;
use std::io::Write;

use crate::models::MergeEntry;

/// Upper bound for progress reported while pages are still loading.
pub const LOAD_PROGRESS_CAP: u8 = 60;
/// Checkpoint reported once the merge plan has been built.
pub const PLAN_PROGRESS: u8 = 65;
/// Start of the band used while merges are applied.
pub const APPLY_PROGRESS_START: u8 = 70;

/// A single event emitted during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// Overall percentage (0–100) plus a human-readable phase label.
    Progress { percent: u8, phase: String },
    /// Leading slice of the computed plan alongside its true size.
    PlanPreview {
        total: usize,
        entries: Vec<MergeEntry>,
    },
    /// Host records dropped during loading because their id was unusable.
    Skipped { count: usize },
}

impl RunEvent {
    pub fn progress(percent: u8, phase: impl Into<String>) -> Self {
        RunEvent::Progress {
            percent: percent.min(100),
            phase: phase.into(),
        }
    }
}

/// Receives run events. Implementations write to stderr (human or JSON).
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent);
}

/// Human-friendly progress on stderr: "[ 42%] loading tags".
pub struct StderrProgress;

impl RunReporter for StderrProgress {
    fn report(&self, event: RunEvent) {
        let text = match &event {
            RunEvent::Progress { percent, phase } => format!("[{:>3}%] {}\n", percent, phase),
            RunEvent::PlanPreview { total, entries } => {
                let mut text = format!("merge plan: {} entries\n", format_number(*total as u64));
                for entry in entries {
                    text.push_str(&format!("  {} -> {}\n", entry.source_id, entry.target_id));
                }
                if *total > entries.len() {
                    text.push_str(&format!("  ... and {} more\n", total - entries.len()));
                }
                text
            }
            RunEvent::Skipped { count } => {
                format!("warning: skipped {} tag records with invalid ids\n", count)
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl RunReporter for JsonProgress {
    fn report(&self, event: RunEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl RunReporter for NoProgress {
    fn report(&self, _event: RunEvent) {}
}

/// Map `done / total` into the `[start, end]` percentage band.
pub fn scaled_percent(done: u64, total: u64, start: u8, end: u8) -> u8 {
    if total == 0 {
        return end;
    }
    let span = u64::from(end.saturating_sub(start));
    let scaled = done.min(total) * span / total;
    start + scaled as u8
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn RunReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_comma() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn scaled_percent_stays_in_band() {
        assert_eq!(scaled_percent(0, 10, 0, 60), 0);
        assert_eq!(scaled_percent(5, 10, 0, 60), 30);
        assert_eq!(scaled_percent(10, 10, 0, 60), 60);
        assert_eq!(scaled_percent(25, 10, 0, 60), 60);
        assert_eq!(scaled_percent(1, 3, 70, 100), 80);
        assert_eq!(scaled_percent(3, 3, 70, 100), 100);
        assert_eq!(scaled_percent(0, 0, 70, 100), 100);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(
            RunEvent::progress(140, "done"),
            RunEvent::Progress {
                percent: 100,
                phase: "done".to_string()
            }
        );
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(RunEvent::Skipped { count: 2 }).unwrap();
        assert_eq!(json, serde_json::json!({"event": "skipped", "count": 2}));

        let json = serde_json::to_value(RunEvent::PlanPreview {
            total: 3,
            entries: vec![MergeEntry {
                source_id: 1,
                target_id: 2,
            }],
        })
        .unwrap();
        assert_eq!(json["event"], "plan_preview");
        assert_eq!(json["total"], 3);
        assert_eq!(json["entries"][0]["source_id"], 1);
    }
}
