use serde::{Deserialize, Serialize};

/// One sequential draw round of a prize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubBatch {
    #[serde(default)]
    pub id: String,
    pub count: u32,
    #[serde(default)]
    pub is_used_count: u32,
}

impl SubBatch {
    pub fn remaining(&self) -> u32 {
        self.count.saturating_sub(self.is_used_count)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeparateCount {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub count_list: Vec<SubBatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sort: u32,
    /// Draw from everyone not yet holding this prize instead of everyone not yet won.
    #[serde(default)]
    pub is_all: bool,
    pub count: u32,
    #[serde(default)]
    pub is_used_count: u32,
    #[serde(default)]
    pub is_used: bool,
    #[serde(default)]
    pub separate_count: SeparateCount,
    #[serde(default)]
    pub desc: String,
    #[serde(default = "default_true")]
    pub is_show: bool,
    #[serde(default)]
    pub picture: PrizePicture,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrizePicture {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

fn default_true() -> bool {
    true
}

impl Prize {
    pub fn new(id: &str, name: &str, count: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            sort: 0,
            is_all: false,
            count,
            is_used_count: 0,
            is_used: false,
            separate_count: SeparateCount::default(),
            desc: String::new(),
            is_show: true,
            picture: PrizePicture::default(),
        }
    }

    pub fn with_batches(mut self, batches: &[(u32, u32)]) -> Self {
        self.separate_count = SeparateCount {
            enable: true,
            count_list: batches
                .iter()
                .enumerate()
                .map(|(idx, (count, used))| SubBatch {
                    id: idx.to_string(),
                    count: *count,
                    is_used_count: *used,
                })
                .collect(),
        };
        self
    }

    /// Index of the first sub-batch that still owes winners, if sub-batches are in use.
    pub fn active_batch(&self) -> Option<usize> {
        if !self.separate_count.enable {
            return None;
        }
        self.separate_count
            .count_list
            .iter()
            .position(|batch| batch.is_used_count < batch.count)
    }

    /// Number of winners the next round must draw.
    pub fn leftover(&self) -> u32 {
        match self.active_batch() {
            Some(idx) => self.separate_count.count_list[idx].remaining(),
            None => self.count.saturating_sub(self.is_used_count),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.is_used || self.is_used_count >= self.count
    }

    /// Records a committed round of `round_size` winners.
    pub fn commit(&mut self, round_size: u32) {
        if let Some(idx) = self.active_batch() {
            let batch = &mut self.separate_count.count_list[idx];
            batch.is_used_count = batch.is_used_count.saturating_add(round_size);
        }
        self.is_used_count = self.is_used_count.saturating_add(round_size);
        if self.is_used_count >= self.count {
            self.is_used = true;
            self.is_used_count = self.count;
        }
    }

    /// Resets the counters; installs a single sub-batch covering the whole
    /// count unless a multi-batch split is already configured.
    pub fn reset_for_selection(&mut self) {
        self.is_used_count = 0;
        self.is_used = false;
        if self.separate_count.count_list.len() > 1 {
            for batch in &mut self.separate_count.count_list {
                batch.is_used_count = 0;
            }
            return;
        }
        self.separate_count = SeparateCount {
            enable: true,
            count_list: vec![SubBatch {
                id: "0".to_string(),
                count: self.count,
                is_used_count: 0,
            }],
        };
    }

    pub fn toggle_used(&mut self) {
        self.is_used_count = if self.is_used { 0 } else { self.count };
        self.separate_count.count_list.clear();
        self.is_used = !self.is_used;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leftover_without_batches() {
        let mut prize = Prize::new("p", "P", 3);
        prize.is_used_count = 1;
        assert_eq!(prize.leftover(), 2);
    }

    #[test]
    fn leftover_uses_first_open_batch() {
        let prize = Prize::new("p", "P", 5).with_batches(&[(2, 2), (3, 0)]);
        assert_eq!(prize.active_batch(), Some(1));
        assert_eq!(prize.leftover(), 3);
    }

    #[test]
    fn disabled_batches_are_ignored() {
        let mut prize = Prize::new("p", "P", 5).with_batches(&[(2, 0), (3, 0)]);
        prize.separate_count.enable = false;
        assert_eq!(prize.leftover(), 5);
    }

    #[test]
    fn commit_updates_batch_and_closes_prize() {
        let mut prize = Prize::new("p", "P", 5).with_batches(&[(2, 2), (3, 0)]);
        prize.is_used_count = 2;
        prize.commit(3);
        assert_eq!(prize.separate_count.count_list[1].is_used_count, 3);
        assert_eq!(prize.is_used_count, 5);
        assert!(prize.is_used);
    }

    #[test]
    fn commit_clamps_overshoot() {
        let mut prize = Prize::new("p", "P", 2);
        prize.commit(4);
        assert_eq!(prize.is_used_count, 2);
        assert!(prize.is_used);
    }

    #[test]
    fn partial_commit_keeps_prize_open() {
        let mut prize = Prize::new("p", "P", 10);
        prize.commit(4);
        assert_eq!(prize.is_used_count, 4);
        assert!(!prize.is_used);
        assert_eq!(prize.leftover(), 6);
    }

    #[test]
    fn selection_installs_single_batch() {
        let mut prize = Prize::new("p", "P", 4);
        prize.is_used_count = 4;
        prize.is_used = true;
        prize.reset_for_selection();
        assert!(!prize.is_used);
        assert_eq!(prize.separate_count.count_list.len(), 1);
        assert_eq!(prize.separate_count.count_list[0].count, 4);
    }

    #[test]
    fn selection_keeps_multi_batch_split() {
        let mut prize = Prize::new("p", "P", 5).with_batches(&[(2, 2), (3, 1)]);
        prize.reset_for_selection();
        assert_eq!(prize.separate_count.count_list.len(), 2);
        assert!(prize
            .separate_count
            .count_list
            .iter()
            .all(|batch| batch.is_used_count == 0));
    }

    #[test]
    fn toggle_flips_usage() {
        let mut prize = Prize::new("p", "P", 4).with_batches(&[(4, 1)]);
        prize.toggle_used();
        assert!(prize.is_used);
        assert_eq!(prize.is_used_count, 4);
        assert!(prize.separate_count.count_list.is_empty());
        prize.toggle_used();
        assert!(!prize.is_used);
        assert_eq!(prize.is_used_count, 0);
    }

    #[test]
    fn parses_original_prize_shape() {
        let raw = r#"{"id":"001","name":"Fifth Prize","sort":1,"isAll":false,"count":10,"isUsedCount":0,"separateCount":{"enable":true,"countList":[]},"picture":{"id":"1","name":"Fifth Prize","url":""},"desc":"Fifth","isShow":true,"isUsed":false}"#;
        let prize: Prize = serde_json::from_str(raw).expect("parse");
        assert_eq!(prize.count, 10);
        assert!(prize.separate_count.enable);
        assert_eq!(prize.active_batch(), None);
        assert_eq!(prize.leftover(), 10);
    }
}
