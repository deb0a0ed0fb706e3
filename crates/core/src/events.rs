use crate::{LotteryStatus, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    Mounted {
        slots: usize,
    },
    StatusChanged {
        from: LotteryStatus,
        to: LotteryStatus,
    },
    /// A precondition of `start` failed; nothing changed.
    Warning(ValidationError),
    DrawStarted {
        prize_id: String,
        prize_name: String,
        leftover: usize,
    },
    Revealed {
        prize_id: String,
        winners: Vec<u64>,
        slots: Vec<usize>,
    },
    WinEffectsFired {
        sound: bool,
        confetti: bool,
    },
    Committed {
        prize_id: String,
        round_size: usize,
        is_used_count: u32,
        is_used: bool,
    },
    RoundDiscarded {
        prize_id: String,
        round_size: usize,
    },
    /// An invariant broke mid-round; the round was dropped.
    RoundAborted {
        reason: String,
    },
    TornDown,
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
