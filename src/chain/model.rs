use std::collections::HashMap;

use log::debug;

use super::difficulty::Difficulty;
use super::link::{Address, Link, LinkRecord};
use super::miner::{Miner, MiningBudget};
use crate::error::{ChainError, Result, VerificationFailure, VerificationReason};

/// Whether empty payloads are accepted. Left to the caller; the chain
/// itself attaches no meaning to payload bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadPolicy {
    #[default]
    AllowEmpty,
    RejectEmpty,
}

/// An append-only proof-of-work hash chain. Always holds at least the
/// genesis link; grows only at the tip, never shrinks, never mutates in
/// place.
#[derive(Debug, Clone)]
pub struct Chain {
    links: Vec<Link>,
    by_address: HashMap<Address, usize>,
    miner: Miner,
    policy: PayloadPolicy,
}

impl Chain {
    /// Create a chain by mining a parentless genesis link.
    pub fn genesis(payload: impl Into<Vec<u8>>, difficulty: Difficulty) -> Result<Self> {
        Self::genesis_with_policy(payload, difficulty, PayloadPolicy::default())
    }

    pub fn genesis_with_policy(
        payload: impl Into<Vec<u8>>,
        difficulty: Difficulty,
        policy: PayloadPolicy,
    ) -> Result<Self> {
        let payload = payload.into();
        check_payload(&payload, policy)?;

        let miner = Miner::new(difficulty);
        let genesis = miner.mine(None, &payload);
        debug!("genesis link mined: {}", genesis.address());

        let mut by_address = HashMap::new();
        by_address.insert(*genesis.address(), 0);
        Ok(Self {
            links: vec![genesis],
            by_address,
            miner,
            policy,
        })
    }

    /// Mine and append a new link carrying `payload`, pointed at the
    /// current tip. Returns the freshly mined link.
    pub fn append(&mut self, payload: impl Into<Vec<u8>>) -> Result<&Link> {
        self.append_with_budget(payload, &MiningBudget::UNBOUNDED)
    }

    /// Like [`Chain::append`], but gives up with
    /// [`ChainError::MiningAborted`] once the budget is exhausted. An
    /// aborted append leaves the chain untouched; the caller may retry
    /// with a larger budget.
    pub fn append_with_budget(
        &mut self,
        payload: impl Into<Vec<u8>>,
        budget: &MiningBudget,
    ) -> Result<&Link> {
        let payload = payload.into();
        check_payload(&payload, self.policy)?;

        let parent = *self.tip().address();
        let link = self.miner.mine_with_budget(Some(&parent), &payload, budget)?;
        debug!(
            "appended link {} at height {} (nonce {})",
            link.address(),
            self.links.len(),
            link.nonce()
        );

        self.by_address
            .entry(*link.address())
            .or_insert(self.links.len());
        self.links.push(link);
        Ok(self.tip())
    }

    /// Walk the chain from genesis to tip, independently recomputing every
    /// link's address and checking the difficulty and parent linkage.
    /// Returns the first failing index and the reason.
    pub fn verify(&self) -> std::result::Result<(), VerificationFailure> {
        let difficulty = self.miner.difficulty();
        for (index, link) in self.links.iter().enumerate() {
            let fail = |reason| VerificationFailure { index, reason };

            let recomputed = link.recompute_address();
            if recomputed != *link.address() {
                return Err(fail(VerificationReason::AddressMismatch));
            }
            if !difficulty.admits(&recomputed) {
                return Err(fail(VerificationReason::DifficultyNotMet));
            }
            let linked = match index {
                0 => link.parent_address().is_none(),
                _ => link.parent_address() == Some(self.links[index - 1].address()),
            };
            if !linked {
                return Err(fail(VerificationReason::ParentLinkBroken));
            }
        }
        Ok(())
    }

    /// Find a link by its address.
    pub fn lookup(&self, address: &Address) -> Option<&Link> {
        self.by_address.get(address).map(|&index| &self.links[index])
    }

    /// The most recently appended link.
    pub fn tip(&self) -> &Link {
        self.links
            .last()
            .expect("chain always holds at least the genesis link")
    }

    pub fn genesis_link(&self) -> &Link {
        &self.links[0]
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Always false; kept so the type plays well with emptiness checks.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn iter(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.miner.difficulty()
    }

    pub fn policy(&self) -> PayloadPolicy {
        self.policy
    }

    /// Export the persisted form: content only, addresses omitted.
    pub fn to_records(&self) -> Vec<LinkRecord> {
        self.links.iter().map(Link::record).collect()
    }

    /// Rebuild a chain from persisted records. Every address is recomputed
    /// from the record's content and the whole chain is verified, so
    /// tampering with stored records surfaces here as a typed failure.
    pub fn from_records(
        records: Vec<LinkRecord>,
        difficulty: Difficulty,
        policy: PayloadPolicy,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(ChainError::EmptyChainAccess);
        }
        for record in &records {
            check_payload(&record.payload, policy)?;
        }

        let links: Vec<Link> = records.into_iter().map(Link::from_record).collect();
        let mut by_address = HashMap::with_capacity(links.len());
        for (index, link) in links.iter().enumerate() {
            by_address.entry(*link.address()).or_insert(index);
        }

        let chain = Self {
            links,
            by_address,
            miner: Miner::new(difficulty),
            policy,
        };
        chain.verify()?;
        Ok(chain)
    }
}

fn check_payload(payload: &[u8], policy: PayloadPolicy) -> Result<()> {
    if payload.is_empty() && policy == PayloadPolicy::RejectEmpty {
        return Err(ChainError::EmptyPayload);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::link::derive_address;

    fn narrative_chain(difficulty: Difficulty) -> Chain {
        let mut chain = Chain::genesis("Amy pays Joe $5", difficulty).unwrap();
        chain.append("Joe pays Amy $7").unwrap();
        chain.append("Amy pays Lisa $3").unwrap();
        chain
    }

    #[test]
    fn genesis_under_trivial_difficulty_uses_nonce_zero() {
        let chain = Chain::genesis("Amy pays Joe $5", Difficulty::TRIVIAL).unwrap();
        let genesis = chain.genesis_link();
        assert!(genesis.is_genesis());
        assert_eq!(genesis.nonce(), 0);
        assert_eq!(
            *genesis.address(),
            derive_address(None, b"Amy pays Joe $5", 0)
        );
    }

    #[test]
    fn append_links_to_previous_tip_and_verifies() {
        let mut chain = Chain::genesis("Amy pays Joe $5", Difficulty::TRIVIAL).unwrap();
        let genesis_address = *chain.tip().address();

        let link = chain.append("Joe pays Amy $7").unwrap();
        assert_eq!(link.parent_address(), Some(&genesis_address));

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.verify(), Ok(()));
    }

    #[test]
    fn append_under_real_difficulty_verifies() {
        let chain = narrative_chain(Difficulty::from_leading_zero_bits(8));
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.verify(), Ok(()));
        for link in chain.iter() {
            assert!(chain.difficulty().admits(link.address()));
        }
    }

    #[test]
    fn lookup_finds_each_link_by_address() {
        let chain = narrative_chain(Difficulty::TRIVIAL);
        for link in chain.iter() {
            assert_eq!(chain.lookup(link.address()), Some(link));
        }
        let absent = derive_address(None, b"not in the chain", 0);
        assert_eq!(chain.lookup(&absent), None);
    }

    #[test]
    fn empty_payload_rejected_only_by_policy() {
        assert!(Chain::genesis("", Difficulty::TRIVIAL).is_ok());

        let err = Chain::genesis_with_policy("", Difficulty::TRIVIAL, PayloadPolicy::RejectEmpty)
            .unwrap_err();
        assert_eq!(err, ChainError::EmptyPayload);

        let mut chain = Chain::genesis_with_policy(
            "Amy pays Joe $5",
            Difficulty::TRIVIAL,
            PayloadPolicy::RejectEmpty,
        )
        .unwrap();
        assert_eq!(chain.append("").unwrap_err(), ChainError::EmptyPayload);
    }

    #[test]
    fn in_place_payload_edit_detected_as_address_mismatch() {
        let mut chain = narrative_chain(Difficulty::TRIVIAL);
        chain.links[1].payload = b"Joe pays Amy $700".to_vec();

        assert_eq!(
            chain.verify(),
            Err(VerificationFailure {
                index: 1,
                reason: VerificationReason::AddressMismatch,
            })
        );
    }

    #[test]
    fn edit_with_recomputed_address_breaks_the_next_parent_link() {
        // Attacker rewrites link 1 consistently, but link 2 still points at
        // the old address. This is the rippling-recomputation property: a
        // mid-chain edit invalidates everything after it.
        let mut chain = narrative_chain(Difficulty::TRIVIAL);
        let parent = chain.links[1].parent_address;
        chain.links[1] = Link::new(parent, b"Joe pays Amy $700".to_vec(), 0);

        assert_eq!(
            chain.verify(),
            Err(VerificationFailure {
                index: 2,
                reason: VerificationReason::ParentLinkBroken,
            })
        );
    }

    #[test]
    fn edit_without_remining_fails_the_difficulty_check() {
        let difficulty = Difficulty::from_leading_zero_bits(8);
        let mut chain = narrative_chain(difficulty);

        // Pick a nonce whose recomputed address misses the threshold, so
        // the forgery is self-consistent but unmined.
        let parent = chain.links[1].parent_address;
        let forged_payload = b"Joe pays Amy $700".to_vec();
        let mut nonce = 0;
        while difficulty.admits(&derive_address(parent.as_ref(), &forged_payload, nonce)) {
            nonce += 1;
        }
        chain.links[1] = Link::new(parent, forged_payload, nonce);

        assert_eq!(
            chain.verify(),
            Err(VerificationFailure {
                index: 1,
                reason: VerificationReason::DifficultyNotMet,
            })
        );
    }

    #[test]
    fn aborted_append_leaves_the_chain_untouched() {
        let mut chain = Chain::genesis("Amy pays Joe $5", Difficulty::TRIVIAL).unwrap();
        let tip_before = *chain.tip().address();

        let err = chain
            .append_with_budget("Joe pays Amy $7", &MiningBudget::attempts(0))
            .unwrap_err();
        assert_eq!(err, ChainError::MiningAborted { attempts: 0 });

        assert_eq!(chain.len(), 1);
        assert_eq!(*chain.tip().address(), tip_before);
        assert_eq!(chain.verify(), Ok(()));
    }

    #[test]
    fn records_round_trip_through_load() {
        let chain = narrative_chain(Difficulty::from_leading_zero_bits(4));
        let restored = Chain::from_records(
            chain.to_records(),
            chain.difficulty(),
            PayloadPolicy::default(),
        )
        .unwrap();

        assert_eq!(restored.links(), chain.links());
        assert_eq!(restored.verify(), Ok(()));
    }

    #[test]
    fn loading_no_records_is_an_empty_chain_access() {
        let err =
            Chain::from_records(Vec::new(), Difficulty::TRIVIAL, PayloadPolicy::default())
                .unwrap_err();
        assert_eq!(err, ChainError::EmptyChainAccess);
    }

    #[test]
    fn tampered_records_are_rejected_on_load() {
        let chain = narrative_chain(Difficulty::TRIVIAL);
        let mut records = chain.to_records();
        records[1].payload = b"Joe pays Amy $700".to_vec();

        // Addresses are recomputed on load, so the edit shows up as link 2
        // pointing at an address that no longer exists.
        let err = Chain::from_records(records, chain.difficulty(), PayloadPolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            ChainError::Verification(VerificationFailure {
                index: 2,
                reason: VerificationReason::ParentLinkBroken,
            })
        );
    }

    #[test]
    fn loading_under_a_harder_difficulty_fails() {
        let chain = narrative_chain(Difficulty::TRIVIAL);
        let err = Chain::from_records(
            chain.to_records(),
            Difficulty::from_leading_zero_bits(32),
            PayloadPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ChainError::Verification(VerificationFailure {
                reason: VerificationReason::DifficultyNotMet,
                ..
            })
        ));
    }
}
