use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    /// At most one season is active at a time.
    pub is_active: bool,
}

/// One member's title for one week of a season. `title_id` is `None` when the
/// member held no title that week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TitleAssignment {
    pub id: String,
    pub season_id: String,
    pub week_number: u32,
    #[serde(rename = "userId")]
    pub member_id: String,
    pub title_id: Option<String>,
}

impl TitleAssignment {
    /// Deterministic document id: one record per (season, week, member).
    pub fn document_id(season_id: &str, week: u32, member_id: &str) -> String {
        format!("assign_{season_id}_{week}_{member_id}")
    }
}
