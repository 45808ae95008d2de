use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum MedalType {
    Gold,
    Silver,
    Bronze,
}

impl MedalType {
    /// Counter column on `users` bumped by an award of this type.
    pub fn counter_column(self) -> &'static str {
        match self {
            MedalType::Gold => "gold_medals",
            MedalType::Silver => "silver_medals",
            MedalType::Bronze => "bronze_medals",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BadgeAward {
    pub id: String,
    pub user_id: String,
    pub awarded_by: String,
    pub awarded_by_name: String,
    pub activity_id: Option<String>,
    pub activity_title: Option<String>,
    pub medal_type: MedalType,
    pub reason: Option<String>,
    pub created_at: String,
}
