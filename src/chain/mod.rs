pub mod difficulty;
pub mod link;
pub mod miner;
pub mod model;

pub use difficulty::Difficulty;
pub use link::{Address, DIGEST_LEN, Link, LinkRecord, derive_address};
pub use miner::{Miner, MiningBudget};
pub use model::{Chain, PayloadPolicy};

/// Default difficulty for demos: leading zero bits of the threshold.
/// Expected work doubles per bit; keep low to avoid long waits.
pub const DEFAULT_DIFFICULTY_BITS: u32 = 12;
