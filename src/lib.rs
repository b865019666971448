//! Content-addressed hash chain with proof-of-work mining.
//!
//! A [`Chain`] is an append-only sequence of [`Link`]s. A link's identity
//! is its [`Address`]: the hash of its parent's address, its payload, and
//! a mined nonce. Appending requires a brute-force nonce search against a
//! [`Difficulty`] threshold, so rewriting history is computationally
//! expensive while [`Chain::verify`] stays cheap.

pub mod chain;
pub mod error;

pub use chain::{
    Address, Chain, DEFAULT_DIFFICULTY_BITS, DIGEST_LEN, Difficulty, Link, LinkRecord, Miner,
    MiningBudget, PayloadPolicy, derive_address,
};
pub use error::{ChainError, Result, VerificationFailure, VerificationReason};
