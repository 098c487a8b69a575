use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An internship listing as stored in the document store. Several fields come
/// in more than one shape upstream (numbers vs. strings, timestamp objects vs.
/// date strings), so those are untagged enums and get normalized at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Internship {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub organization: Option<String>,
    /// Anchor fragment used for share links; falls back to `id` when absent.
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub duration_weeks: Option<DurationField>,
    #[serde(default)]
    pub cost: Option<Costs>,
    #[serde(default)]
    pub deadlines: Vec<DeadlineEntry>,
    #[serde(default)]
    pub date_added: Option<DateField>,
}

/// Duration as listed: a number of weeks, or free text ("Rolling basis").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationField {
    Weeks(f64),
    Text(String),
}

/// A date as the backend delivers it: a timestamp object or a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateField {
    Timestamp(RemoteTimestamp),
    Text(String),
}

/// Backend timestamp object shape (epoch seconds + nanoseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTimestamp {
    pub seconds: i64,
    #[serde(default)]
    pub nanoseconds: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Costs {
    #[serde(default)]
    pub costs: Option<Vec<CostEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostEntry {
    #[serde(default)]
    pub lowest: Option<PriceValue>,
}

/// A "lowest price" value. Non-numeric junk shows up in real documents; it
/// deserializes into `Other` and is excluded from cost aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Amount(f64),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadlineEntry {
    #[serde(default)]
    pub name: Option<String>,
    /// Date string, or the literal placeholder "not provided".
    #[serde(default)]
    pub date: Option<String>,
}

/// Per-user preference document. Pure value object, no behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub grade_levels: Vec<u8>,
    #[serde(default)]
    pub location: PreferredLocation,
    #[serde(default)]
    pub min_duration_weeks: Option<f64>,
    #[serde(default)]
    pub stipend_required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferredLocation {
    #[serde(rename = "virtual", default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
}

/// internship id -> eligibility item id -> satisfied. A missing entry means
/// "unknown", not "false".
pub type EligibilityMap = HashMap<String, HashMap<String, bool>>;

/// A user-filed issue report against a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub internship_id: String,
    pub user_id: Option<String>,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: String,
    pub resolved_at: Option<String>,
    pub resolved_by: Option<String>,
    pub rejected_at: Option<String>,
    pub rejected_by: Option<String>,
    pub notes: Option<String>,
}

/// Lifecycle is monotonic: pending -> resolved | rejected, never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Resolved,
    Rejected,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReportStatus::Pending),
            "resolved" => Some(ReportStatus::Resolved),
            "rejected" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }
}
