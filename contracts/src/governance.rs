//! Strategy proposals and weighted voting.
//!
//! A proposal accepts one vote per address until `voting_ends_at`.
//! After the window it can be finalized: approved when `votes_for`
//! beats `votes_against` and reaches the quorum, rejected otherwise.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::RouterError;
use crate::types::{ProposalStatus, StrategyProposal};

/// Longest accepted proposal description, in bytes
pub const MAX_DESCRIPTION_LEN: usize = 256;

/// Governance module
#[odra::module]
pub struct Governance {
    /// Proposals by id (ids start at 1)
    proposals: Mapping<u64, StrategyProposal>,
    /// Last issued proposal id
    proposal_count: Var<u64>,
    /// (proposal, voter) -> voted
    votes: Mapping<(u64, Address), bool>,
}

#[odra::module]
impl Governance {
    /// Get a proposal
    pub fn get_strategy_proposal(&self, proposal_id: u64) -> Option<StrategyProposal> {
        self.proposals.get(&proposal_id)
    }

    /// Check if `voter` already voted on a proposal
    pub fn has_voted(&self, proposal_id: u64, voter: Address) -> bool {
        self.votes.get(&(proposal_id, voter)).unwrap_or(false)
    }

    /// Get the number of proposals created
    pub fn get_proposal_count(&self) -> u64 {
        self.proposal_count.get_or_default()
    }
}

impl Governance {
    /// Open a proposal for an already validated protocol.
    pub fn propose(
        &mut self,
        proposer: Address,
        protocol: Address,
        description: String,
        height: u64,
        voting_period: u64,
    ) -> u64 {
        if description.len() > MAX_DESCRIPTION_LEN {
            self.env().revert(RouterError::DescriptionTooLong);
        }

        let proposal_id = self.get_proposal_count() + 1;
        self.proposals.set(
            &proposal_id,
            StrategyProposal {
                proposer,
                protocol,
                description,
                votes_for: U256::zero(),
                votes_against: U256::zero(),
                status: ProposalStatus::Pending,
                created_at: height,
                voting_ends_at: height.saturating_add(voting_period),
            },
        );
        self.proposal_count.set(proposal_id);
        proposal_id
    }

    /// Record a weighted vote.
    pub fn vote(&mut self, proposal_id: u64, voter: Address, support: bool, weight: U256, height: u64) {
        if weight.is_zero() {
            self.env().revert(RouterError::InvalidAmount);
        }

        let mut proposal = self.require_proposal(proposal_id);
        if proposal.status != ProposalStatus::Pending || height >= proposal.voting_ends_at {
            self.env().revert(RouterError::ProposalClosed);
        }
        if self.has_voted(proposal_id, voter) {
            self.env().revert(RouterError::AlreadyVoted);
        }

        if support {
            proposal.votes_for = proposal.votes_for.saturating_add(weight);
        } else {
            proposal.votes_against = proposal.votes_against.saturating_add(weight);
        }
        self.proposals.set(&proposal_id, proposal);
        self.votes.set(&(proposal_id, voter), true);
    }

    /// Resolve a proposal whose voting window has closed.
    pub fn finalize(&mut self, proposal_id: u64, height: u64, quorum: U256) -> ProposalStatus {
        let mut proposal = self.require_proposal(proposal_id);
        if proposal.status != ProposalStatus::Pending {
            self.env().revert(RouterError::ProposalClosed);
        }
        if height < proposal.voting_ends_at {
            self.env().revert(RouterError::VotingActive);
        }

        proposal.status = resolve(proposal.votes_for, proposal.votes_against, quorum);
        let status = proposal.status;
        self.proposals.set(&proposal_id, proposal);
        status
    }

    fn require_proposal(&self, proposal_id: u64) -> StrategyProposal {
        self.proposals
            .get(&proposal_id)
            .unwrap_or_else(|| self.env().revert(RouterError::ProposalNotFound))
    }
}

/// Outcome of a closed vote.
pub fn resolve(votes_for: U256, votes_against: U256, quorum: U256) -> ProposalStatus {
    if votes_for > votes_against && votes_for >= quorum {
        ProposalStatus::Approved
    } else {
        ProposalStatus::Rejected
    }
}
