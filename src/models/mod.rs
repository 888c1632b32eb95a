//! Core data models shared by the Riot client and the statistics aggregator.

mod champions;
mod match_record;
mod player;
mod region;
mod stats;
mod window;

pub use champions::*;
pub use match_record::*;
pub use player::*;
pub use region::*;
pub use stats::*;
pub use window::*;
