//! Loading and saving lottery data: settings, persons, prizes and winners.

pub mod load;
pub mod schema;
pub mod store;

pub use load::*;
pub use schema::*;
pub use store::*;
