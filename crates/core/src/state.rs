use crate::{Candidate, Prize};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LotteryStatus {
    /// Idle table, churn running.
    Init,
    /// Armed: sphere formation, slow roll.
    Ready,
    Running,
    /// Winners revealed.
    End,
}

impl LotteryStatus {
    pub fn label(self) -> &'static str {
        match self {
            LotteryStatus::Init => "init",
            LotteryStatus::Ready => "ready",
            LotteryStatus::Running => "running",
            LotteryStatus::End => "end",
        }
    }
}

/// Winners drawn by `start`, assigned slots on `stop`, committed or discarded after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawRound {
    pub prize: Prize,
    pub winners: Vec<Candidate>,
    pub requested: usize,
    pub assigned_slots: Vec<usize>,
}

impl DrawRound {
    pub fn new(prize: Prize, winners: Vec<Candidate>, requested: usize) -> Self {
        Self {
            prize,
            winners,
            requested,
            assigned_slots: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.winners.len()
    }
}
