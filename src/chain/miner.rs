use std::time::{Duration, Instant};

use log::debug;

use super::difficulty::Difficulty;
use super::link::{Address, Link, derive_address};
use crate::error::{ChainError, Result};

/// Caller-imposed cutoff for a mining search. The default is unbounded;
/// either cap may be set independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiningBudget {
    /// Give up after this many nonce attempts.
    pub max_attempts: Option<u64>,
    /// Give up once this much wall-clock time has elapsed.
    pub max_elapsed: Option<Duration>,
}

impl MiningBudget {
    pub const UNBOUNDED: MiningBudget = MiningBudget {
        max_attempts: None,
        max_elapsed: None,
    };

    pub fn attempts(max_attempts: u64) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::UNBOUNDED
        }
    }

    pub fn elapsed(max_elapsed: Duration) -> Self {
        Self {
            max_elapsed: Some(max_elapsed),
            ..Self::UNBOUNDED
        }
    }
}

/// Brute-force proof-of-work search: vary the nonce until the derived
/// address satisfies the difficulty threshold.
#[derive(Debug, Clone, Copy)]
pub struct Miner {
    difficulty: Difficulty,
}

impl Miner {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Mine without a cutoff. Expected attempts grow inversely with the
    /// fraction of the digest space the threshold admits, so callers
    /// facing a hard threshold should prefer [`Miner::mine_with_budget`].
    pub fn mine(&self, parent_address: Option<&Address>, payload: &[u8]) -> Link {
        self.mine_with_budget(parent_address, payload, &MiningBudget::UNBOUNDED)
            .expect("unbounded mining cannot abort")
    }

    /// Mine, giving up with [`ChainError::MiningAborted`] once the budget
    /// is exhausted. Nonces are tried sequentially from 0, so the result
    /// is the smallest qualifying nonce.
    pub fn mine_with_budget(
        &self,
        parent_address: Option<&Address>,
        payload: &[u8],
        budget: &MiningBudget,
    ) -> Result<Link> {
        // Poll the wall clock once per interval; an Instant::now() per
        // nonce would dominate the hot loop.
        const DEADLINE_POLL_INTERVAL: u64 = 1024;

        let started = Instant::now();
        let mut attempts: u64 = 0;
        let mut nonce: u64 = 0;

        loop {
            if budget.max_attempts.is_some_and(|max| attempts >= max) {
                debug!("mining aborted: attempt cap hit after {attempts} attempts");
                return Err(ChainError::MiningAborted { attempts });
            }
            if attempts % DEADLINE_POLL_INTERVAL == 0
                && budget.max_elapsed.is_some_and(|max| started.elapsed() >= max)
            {
                debug!("mining aborted: deadline hit after {attempts} attempts");
                return Err(ChainError::MiningAborted { attempts });
            }

            let address = derive_address(parent_address, payload, nonce);
            attempts += 1;
            if self.difficulty.admits(&address) {
                debug!("mined {address} after {attempts} attempts (nonce {nonce})");
                return Ok(Link::new(parent_address.copied(), payload.to_vec(), nonce));
            }
            nonce = nonce.wrapping_add(1);
        }
    }
}
