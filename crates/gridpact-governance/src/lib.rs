/*!
# Gridpact Governance

Proposal machinery for the community: credit-weighted up/down ballots,
committee elections, and change-variable proposals that retune the
community's `Variables` record when they pass.

## Core principles

- **Snapshot voting**: voter (and candidate) credit is captured once at
  proposal creation and reused for that proposal's lifetime. Later credit
  changes never shift an open tally.
- **Deterministic outcomes**: every decision is a pure function of stored
  state and caller input. Snapshots follow the stored registration order,
  committee ranking breaks ties by candidate name, and no decision reads a
  clock — two replicas replaying the same operations agree bit-for-bit.
- **Participation is rewarded**: each accepted vote credits the voter with
  `ballot_award_credit`, written in the same ledger transaction as the vote
  itself, regardless of the eventual outcome.

## Module structure

- **types**: proposal records and their closed state/scope enums
- **ballot**: generic up/down proposals (`BallotEngine`)
- **election**: candidate ranking and the committee (`ElectionEngine`)
- **variables**: the persisted tunables and change-variable proposals
*/

pub mod ballot;
pub mod election;
pub mod types;
pub mod variables;

pub use ballot::BallotEngine;
pub use election::{ElectionEngine, SELF_NOMINATION_CREDIT};
pub use types::{BallotProposal, Candidate, ElectionProposal, ProposalState, Scope, Voter};
pub use variables::{VariableEngine, VariableStore};
