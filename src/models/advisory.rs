//! Travel advisory notices

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

impl Severity {
    /// Badge text shown next to the notice
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "Information",
            Severity::Warning => "Vær Opmærksom",
            Severity::Danger => "Høj Risiko",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AdvisoryNotice {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    pub issued_at: DateTime<Utc>,
    /// Region the notice applies to ("Hele Mexico", "Cancun")
    pub region: String,
}
