use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

use super::error::ValidationError;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 25;

/// Identifier handed out by the store.
///
/// json-server assigns integers or strings depending on its version, so both
/// are accepted and written back in the form they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TaskId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Number(n) => write!(f, "{}", n),
            TaskId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        TaskId::Number(n)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId::Text(s.to_string())
    }
}

/// A title that passed the length check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        validate_title(input)?;
        Ok(Title(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks that `input` holds between 3 and 25 characters, both inclusive.
/// Characters are Unicode scalar values, so an emoji counts once.
pub fn validate_title(input: &str) -> Result<(), ValidationError> {
    let len = input.chars().count();
    if len < TITLE_MIN_LEN {
        return Err(ValidationError::TitleTooShort {
            len,
            min: TITLE_MIN_LEN,
        });
    }
    if len > TITLE_MAX_LEN {
        return Err(ValidationError::TitleTooLong {
            len,
            max: TITLE_MAX_LEN,
        });
    }
    Ok(())
}

/// Live feedback for a draft still being typed: an empty draft is not flagged.
pub fn draft_problem(draft: &str) -> Option<ValidationError> {
    if draft.is_empty() {
        return None;
    }
    validate_title(draft).err()
}

/// Client clock truncated to the millisecond, the precision timestamps are written with.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Copy with the completion flag flipped.
    pub fn toggled(&self) -> Task {
        Task {
            is_completed: !self.is_completed,
            ..self.clone()
        }
    }

    /// Copy carrying `title` instead of the current one.
    pub fn renamed(&self, title: Title) -> Task {
        Task {
            title: title.into_inner(),
            ..self.clone()
        }
    }

    /// Stamps `updated_at` with the current time, never letting it stand still
    /// or go backwards.
    pub fn touch(&mut self) {
        let floor = self.updated_at + Duration::milliseconds(1);
        self.updated_at = std::cmp::max(now(), floor);
    }

    /// Pulls `updated_at` up to `created_at` when a record arrives with the two
    /// out of order. Returns whether the record had to be fixed.
    pub fn normalize(&mut self) -> bool {
        if self.updated_at < self.created_at {
            self.updated_at = self.created_at;
            return true;
        }
        false
    }
}

/// Body of a create request: every task field except the id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub is_completed: bool,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub updated_at: DateTime<Utc>,
}

impl NewTask {
    pub fn new(title: Title) -> Self {
        let ts = now();
        Self {
            title: title.into_inner(),
            is_completed: false,
            created_at: ts,
            updated_at: ts,
        }
    }

    pub fn with_id(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            is_completed: self.is_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix, the same shape
/// browsers produce with `toISOString`.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
