//! Lottery draw engine. Keep this crate free of IO and platform concerns.

pub mod animation;
pub mod cards;
pub mod config;
pub mod confetti;
pub mod effects;
pub mod events;
pub mod geometry;
pub mod layout;
pub mod prize;
pub mod rng;
pub mod roster;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod stage;
pub mod state;
pub mod store;
pub mod tween;

pub use animation::*;
pub use cards::*;
pub use config::*;
pub use confetti::*;
pub use effects::*;
pub use events::*;
pub use geometry::*;
pub use layout::*;
pub use prize::*;
pub use rng::*;
pub use roster::*;
pub use scheduler::*;
pub use selection::*;
pub use session::*;
pub use stage::*;
pub use state::*;
pub use store::*;
pub use tween::*;
