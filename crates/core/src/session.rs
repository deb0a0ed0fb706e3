use crate::{
    AnimationDriver, AudioBackend, Candidate, CardMode, ConfettiField, DrawRound, EventBus,
    GroupId, LotteryConfig, LotteryStatus, LotteryStore, RevealGuard, RngState, Scheduler,
    SilentAudio, SoundBoard, Stage, StoreError, TaskId, Transform,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod commit;
mod draw;
mod enter;
mod frame;
mod reveal;
mod state;

pub use frame::{Key, SessionSnapshot};

const DRAW_STREAM: u64 = 1;
const COSMETIC_STREAM: u64 = 2;

/// Preconditions of `start`; surfaced to the user, never change state.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no prize is selected")]
    NoCurrentPrize,
    #[error("prize {0} is already fully drawn")]
    PrizeExhausted(String),
    #[error("not enough people left: need {needed}, have {available}")]
    PoolExhausted { needed: usize, available: usize },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("slot {0} assigned twice")]
    DuplicateSlot(usize),
    #[error("{winners} winners cannot fit in {slots} slots")]
    SlotsExhausted { winners: usize, slots: usize },
    #[error("round has {winners} winners but {slots} slots")]
    RoundSizeMismatch { winners: usize, slots: usize },
}

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("a transition is still animating")]
    Busy,
    #[error("not allowed while {0:?}")]
    InvalidStatus(LotteryStatus),
    #[error("session was torn down")]
    TornDown,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("round aborted: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl LotteryError {
    /// Busy and status mismatches are ignored input, not failures.
    pub fn is_ignored(&self) -> bool {
        matches!(self, LotteryError::Busy | LotteryError::InvalidStatus(_))
    }
}

/// The animation whose completion releases the operation lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Mount(GroupId),
    Enter(GroupId),
    Reveal(GroupId),
    Quit(GroupId),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listeners {
    pub resize: bool,
    pub keyboard: bool,
}

#[derive(Debug, Default)]
struct Formations {
    table: Vec<Transform>,
    sphere: Vec<Transform>,
}

/// One lottery screen: owns the stage, timers, audio and the draw lifecycle.
pub struct LotterySession<S: LotteryStore, A: AudioBackend = SilentAudio> {
    pub config: LotteryConfig,
    store: S,
    status: LotteryStatus,
    stage: Stage,
    formations: Formations,
    animation: AnimationDriver,
    scheduler: Scheduler,
    sounds: SoundBoard<A>,
    confetti: ConfettiField,
    guard: RevealGuard,
    draw_rng: RngState,
    cosmetic_rng: RngState,
    events: EventBus,
    candidates: Vec<Candidate>,
    pool: Vec<Candidate>,
    round: Option<DrawRound>,
    pending: Option<Pending>,
    churn: Option<TaskId>,
    churn_mode: CardMode,
    auto_stop: Option<TaskId>,
    cycle: u64,
    listeners: Listeners,
    torn_down: bool,
}
