use crate::{split_name, NameParts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;

/// A person eligible to be drawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: u64,
    #[serde(default)]
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(skip)]
    name_parts: OnceCell<NameParts>,
}

impl Candidate {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            uid: id.to_string(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_detail(mut self, department: &str, identity: &str) -> Self {
        self.department = department.to_string();
        self.identity = identity.to_string();
        self
    }

    pub fn with_avatar(mut self, avatar: &str) -> Self {
        self.avatar = avatar.to_string();
        self
    }

    /// Leading/trailing script split of the display name, computed once.
    pub fn name_parts(&self) -> &NameParts {
        self.name_parts.get_or_init(|| split_name(&self.name))
    }

    pub fn has_avatar(&self) -> bool {
        !self.avatar.trim().is_empty()
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Candidate {}

/// A candidate plus the winner annotations kept by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    #[serde(flatten)]
    pub candidate: Candidate,
    #[serde(default)]
    pub is_win: bool,
    #[serde(default)]
    pub prize_id: Vec<String>,
    #[serde(default)]
    pub prize_name: Vec<String>,
    #[serde(default)]
    pub prize_time: Vec<DateTime<Utc>>,
}

impl PersonRecord {
    pub fn new(candidate: Candidate) -> Self {
        Self {
            candidate,
            is_win: false,
            prize_id: Vec::new(),
            prize_name: Vec::new(),
            prize_time: Vec::new(),
        }
    }

    pub fn won_prize(&self, prize_id: &str) -> bool {
        self.prize_id.iter().any(|id| id == prize_id)
    }

    pub fn record_win(&mut self, prize_id: &str, prize_name: &str, at: DateTime<Utc>) {
        self.is_win = true;
        self.prize_id.push(prize_id.to_string());
        self.prize_name.push(prize_name.to_string());
        self.prize_time.push(at);
    }

    pub fn clear_wins(&mut self) {
        self.is_win = false;
        self.prize_id.clear();
        self.prize_name.clear();
        self.prize_time.clear();
    }
}
