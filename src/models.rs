use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// The single stored credential set written by signup. The password is kept
/// in plain text; this record is not a security boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSignup {
    pub email: String,
    pub password: String,
    pub name: String,
    pub id: String,
}

impl PendingSignup {
    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Terrible,
    Poor,
    Okay,
    #[default]
    Good,
    Excellent,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::Terrible,
        Mood::Poor,
        Mood::Okay,
        Mood::Good,
        Mood::Excellent,
    ];

    /// 1 for terrible through 5 for excellent.
    pub fn score(self) -> u8 {
        match self {
            Mood::Terrible => 1,
            Mood::Poor => 2,
            Mood::Okay => 3,
            Mood::Good => 4,
            Mood::Excellent => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessEntry {
    pub id: String,
    pub date: NaiveDate,
    pub steps: u32,
    pub sleep: f64,
    pub mood: Mood,
    pub water: u32,
    pub exercise: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User-supplied fields of an entry. Missing numbers default to zero, the same
/// as an empty form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub sleep: f64,
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub water: u32,
    #[serde(default)]
    pub exercise: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; only the fields that are present are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub steps: Option<u32>,
    #[serde(default)]
    pub sleep: Option<f64>,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub water: Option<u32>,
    #[serde(default)]
    pub exercise: Option<u32>,
    /// `Some("")` clears the notes.
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellnessStats {
    pub total_steps: u64,
    pub average_sleep: f64,
    pub average_mood: f64,
    pub total_water: u64,
    pub total_exercise: u64,
    pub streak_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: String,
    pub steps: u32,
    pub sleep: f64,
    pub mood: u8,
    pub water: u32,
    pub exercise: u32,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub days: Option<usize>,
}
