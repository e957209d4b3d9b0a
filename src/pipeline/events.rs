//! # Pipeline Events
//!
//! Values that flow from the checks to the result writer.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::document::DocumentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    /// The store is structurally damaged.
    Corruption,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Corruption => "corruption",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Name of the check that produced the finding.
    pub check: String,
    pub severity: Severity,
    /// Subject document, absent for check-level failures.
    pub id: Option<DocumentId>,
    /// Parent the subject points at, when relevant to the finding.
    pub parent: Option<DocumentId>,
    pub description: String,
}

impl Finding {
    pub fn new(check: &str, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            severity,
            id: None,
            parent: None,
            description: description.into(),
        }
    }

    pub fn for_document(mut self, id: &DocumentId) -> Self {
        self.id = Some(id.clone());
        self
    }

    pub fn with_parent(mut self, parent: Option<&DocumentId>) -> Self {
        self.parent = parent.cloned();
        self
    }
}

/// Remaining-time projection carried by a progress update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Remaining {
    /// Plain progress; no projection is attempted.
    Untracked,
    /// Projection requested but no estimate (or no documents yet).
    Unknown,
    Known(Duration),
}

impl Remaining {
    pub fn as_secs(&self) -> Option<f64> {
        match self {
            Remaining::Known(d) => Some(d.as_secs_f64()),
            _ => None,
        }
    }
}

impl Serialize for Remaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Remaining::Untracked => serializer.serialize_none(),
            Remaining::Unknown => serializer.serialize_str("unknown"),
            Remaining::Known(d) => serializer.serialize_f64(d.as_secs_f64()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub processed: u64,
    /// Completed fraction in `0.0..=1.0`, when a total estimate exists.
    pub fraction: Option<f64>,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    #[serde(rename = "eta_secs")]
    pub eta: Remaining,
}

fn serialize_secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// One entry of the result stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckResult {
    Finding(Finding),
    Status { text: String },
    Progress(ProgressUpdate),
    /// Terminal sentinel; never rendered.
    End,
}

impl CheckResult {
    pub fn status(text: impl Into<String>) -> Self {
        CheckResult::Status { text: text.into() }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, CheckResult::End)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CheckResult::Finding(_) => "finding",
            CheckResult::Status { .. } => "status",
            CheckResult::Progress(_) => "progress",
            CheckResult::End => "end",
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckResult::Finding(finding) => {
                write!(f, "[{}] {}", finding.severity, finding.check)?;
                if let Some(id) = &finding.id {
                    write!(f, " {id}")?;
                }
                write!(f, ": {}", finding.description)
            }
            CheckResult::Status { text } => f.write_str(text),
            CheckResult::Progress(update) => {
                write!(f, "progress processed={}", update.processed)?;
                if let Some(fraction) = update.fraction {
                    write!(f, " done={:.1}%", fraction * 100.0)?;
                }
                write!(f, " elapsed={}", format_duration(update.elapsed))?;
                match update.eta {
                    Remaining::Untracked => Ok(()),
                    Remaining::Unknown => f.write_str(" eta=unknown"),
                    Remaining::Known(eta) => write!(f, " eta={}", format_duration(eta)),
                }
            }
            CheckResult::End => f.write_str("end"),
        }
    }
}

/// `h:mm:ss` for long spans, fractional seconds below a minute.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_findings_as_single_lines() {
        let result = CheckResult::Finding(
            Finding::new("orphan", Severity::Corruption, "missing parent 1:/gone")
                .for_document(&DocumentId::new("2:/gone/y")),
        );
        assert_eq!(
            result.to_string(),
            "[corruption] orphan 2:/gone/y: missing parent 1:/gone"
        );
    }

    #[test]
    fn renders_progress_projection_states() {
        let mut update = ProgressUpdate {
            processed: 25,
            fraction: Some(0.25),
            elapsed: Duration::from_secs(10),
            eta: Remaining::Known(Duration::from_secs(30)),
        };
        assert_eq!(
            CheckResult::Progress(update.clone()).to_string(),
            "progress processed=25 done=25.0% elapsed=10.0s eta=30.0s"
        );
        update.eta = Remaining::Unknown;
        update.fraction = None;
        assert_eq!(
            CheckResult::Progress(update.clone()).to_string(),
            "progress processed=25 elapsed=10.0s eta=unknown"
        );
        update.eta = Remaining::Untracked;
        assert_eq!(
            CheckResult::Progress(update).to_string(),
            "progress processed=25 elapsed=10.0s"
        );
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(CheckResult::status("hello")).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["text"], "hello");

        let json = serde_json::to_value(CheckResult::Progress(ProgressUpdate {
            processed: 1,
            fraction: None,
            elapsed: Duration::from_millis(1500),
            eta: Remaining::Unknown,
        }))
        .unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["elapsed_secs"], 1.5);
        assert_eq!(json["eta_secs"], "unknown");
    }

    #[test]
    fn formats_long_durations() {
        assert_eq!(format_duration(Duration::from_secs(3725)), "1:02:05");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
    }
}
