use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use luckydraw_core::{LotteryConfig, PersonRecord, Prize};

/// Selection state kept beside the prize list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(default)]
    pub current_prize: Option<String>,
}

/// One line of the winners export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WinnerEntry {
    pub id: u64,
    pub uid: String,
    pub name: String,
    pub department: String,
    pub prize_id: String,
    pub prize_name: String,
    pub prize_time: Option<DateTime<Utc>>,
}

impl WinnerEntry {
    /// One entry per prize the person holds.
    pub fn from_record(record: &PersonRecord) -> Vec<Self> {
        record
            .prize_id
            .iter()
            .enumerate()
            .map(|(idx, prize_id)| Self {
                id: record.candidate.id,
                uid: record.candidate.uid.clone(),
                name: record.candidate.name.clone(),
                department: record.candidate.department.clone(),
                prize_id: prize_id.clone(),
                prize_name: record.prize_name.get(idx).cloned().unwrap_or_default(),
                prize_time: record.prize_time.get(idx).copied(),
            })
            .collect()
    }
}
