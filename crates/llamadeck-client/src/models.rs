//! Data models for model server operations

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of a model listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    /// Model name/tag (e.g. "mistral:latest"), unique within a listing
    pub name: String,

    /// Size on disk as reported by the server
    pub size: ModelSize,

    /// When the model was last modified
    pub modified_at: ModifiedAt,
}

impl ModelSummary {
    /// Build a summary from one raw `models[]` entry of `/api/tags`.
    ///
    /// Returns `None` when the entry has no string `name`. Size and timestamp
    /// are coerced, never rejected.
    pub fn from_value(entry: &Value) -> Option<Self> {
        let name = entry.get("name")?.as_str()?.to_string();
        Some(Self {
            name,
            size: ModelSize::from_value(entry.get("size")),
            modified_at: ModifiedAt::from_value(entry.get("modified_at")),
        })
    }
}

/// Model size, which the server is not trusted to send as a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSize {
    Bytes(u64),
    Unknown,
}

impl ModelSize {
    /// Coerce a raw JSON size. A missing size counts as zero bytes.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None => ModelSize::Bytes(0),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(bytes) => ModelSize::Bytes(bytes),
                None => match n.as_f64() {
                    Some(f) if f >= 0.0 => ModelSize::Bytes(f as u64),
                    _ => ModelSize::Unknown,
                },
            },
            Some(_) => ModelSize::Unknown,
        }
    }

    /// Size in bytes, if known
    pub fn bytes(&self) -> Option<u64> {
        match self {
            ModelSize::Bytes(b) => Some(*b),
            ModelSize::Unknown => None,
        }
    }

    /// Whole kilobytes with thousands separators, e.g. `4,000,000kB`, or `N/A`
    pub fn display_kb(&self) -> String {
        match self {
            ModelSize::Bytes(b) => format!("{}kB", group_thousands(b / 1024)),
            ModelSize::Unknown => "N/A".to_string(),
        }
    }
}

/// Modification time; unparseable values are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifiedAt {
    Parsed(DateTime<FixedOffset>),
    Raw(String),
}

impl ModifiedAt {
    /// Coerce a raw JSON timestamp. Missing values become `Raw("N/A")`.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => ModifiedAt::Raw("N/A".to_string()),
            Some(Value::String(s)) => Self::parse(s),
            Some(other) => ModifiedAt::Raw(other.to_string()),
        }
    }

    /// Parse ISO-8601. A trailing `Z` means UTC; a missing offset is read as UTC.
    pub fn parse(raw: &str) -> Self {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return ModifiedAt::Parsed(dt);
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"));
        match naive {
            Ok(naive) => ModifiedAt::Parsed(naive.and_utc().fixed_offset()),
            Err(_) => ModifiedAt::Raw(raw.to_string()),
        }
    }

    /// `YYYY/MM/DD HH:MM` in the timestamp's own offset, or the raw text
    pub fn display(&self) -> String {
        match self {
            ModifiedAt::Parsed(dt) => dt.format("%Y/%m/%d %H:%M").to_string(),
            ModifiedAt::Raw(raw) => raw.clone(),
        }
    }

    /// The timestamp in UTC, if it parsed
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            ModifiedAt::Parsed(dt) => Some(dt.with_timezone(&Utc)),
            ModifiedAt::Raw(_) => None,
        }
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// One decoded line of a streaming response body.
///
/// Pull streams carry `status` and, while downloading, `digest`/`completed`/`total`.
/// Generate streams carry `response` fragments and a final `done`. Either may
/// report an in-band `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub digest: Option<String>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub completed: Option<u64>,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub total: Option<u64>,

    #[serde(default)]
    pub response: Option<String>,

    #[serde(default)]
    pub done: Option<bool>,

    #[serde(default)]
    pub error: Option<String>,
}

/// Accept integer or float byte counts; anything else reads as absent
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        _ => None,
    })
}

/// Byte counters for one layer of a multi-layer download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerProgress {
    /// Layer digest, unique per pull
    pub digest: String,

    /// Total declared on first sighting
    pub total_bytes: u64,

    /// Latest completed count reported
    pub completed_bytes: u64,
}

/// Phase of a pull operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PullPhase {
    Starting,
    FetchingManifest,
    Downloading,
    Verifying,
    WritingManifest,
    Cleaning,
    Complete,
}

impl PullPhase {
    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            PullPhase::Starting => "connecting",
            PullPhase::FetchingManifest => "fetching manifest",
            PullPhase::Downloading => "downloading",
            PullPhase::Verifying => "verifying",
            PullPhase::WritingManifest => "writing manifest",
            PullPhase::Cleaning => "cleaning up",
            PullPhase::Complete => "complete",
        }
    }
}

/// Snapshot handed to pull observers on every state change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PullProgress {
    pub phase: PullPhase,

    /// Overall completion, 0-100, never decreasing within a pull
    pub percent: f64,

    pub downloaded_bytes: u64,

    pub total_bytes: u64,
}

/// Result of a successful pull
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub model: String,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    pub layers: usize,
}

/// One completed exchange in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTranscriptEntry {
    pub user_text: String,
    pub ai_text: String,
}

/// Server version information
#[derive(Debug, Clone, PartialEq)]
pub struct VersionInfo {
    /// The `version` field, or `"Unknown"`
    pub version: String,

    /// The full decoded document
    pub raw: Value,
}

impl VersionInfo {
    pub fn from_value(raw: Value) -> Self {
        let version = match raw.get("version") {
            None | Some(Value::Null) => "Unknown".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Self { version, raw }
    }
}
