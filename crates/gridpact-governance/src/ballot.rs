use crate::types::{BallotProposal, ProposalState, Scope, Voter};
use gridpact_ledger::{LedgerBackend, LedgerStore, COMMITTEE_KEY, VARIABLES_KEY};
use gridpact_registry::IdentityRegistry;
use gridpact_types::{timestamp, Committee, GridError, Result, Variables};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Engine for generic up/down proposals.
///
/// Creation snapshots the electorate, voting spends the snapshot weight,
/// checking settles the outcome. The time window is advisory metadata: it is
/// validated for internal order at creation and never consulted again.
#[derive(Clone)]
pub struct BallotEngine {
    store: LedgerStore,
    registry: IdentityRegistry,
}

impl BallotEngine {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        let store = LedgerStore::new(backend);
        let registry = IdentityRegistry::from_store(store.clone());
        Self { store, registry }
    }

    /// Create a proposal whose electorate is snapshotted now.
    pub async fn create(
        &self,
        name: &str,
        proposer: &str,
        scope: Scope,
        start_time: &str,
        end_time: &str,
    ) -> Result<BallotProposal> {
        let proposal = self
            .build(name, proposer, scope, start_time, end_time)
            .await?;
        self.store.put_json(name, &proposal).await?;

        info!(
            proposal = %name,
            proposer = %proposer,
            scope = %scope,
            voters = proposal.number_of_voter,
            "🗳️ Ballot proposal created"
        );

        Ok(proposal)
    }

    /// Validate and assemble a proposal without persisting it. Shared with
    /// the change-variable engine, which attaches its payload before the
    /// single create write.
    pub(crate) async fn build(
        &self,
        name: &str,
        proposer: &str,
        scope: Scope,
        start_time: &str,
        end_time: &str,
    ) -> Result<BallotProposal> {
        if self.store.exists(name).await? {
            return Err(GridError::AlreadyExists(name.to_string()));
        }

        if !timestamp::precedes(start_time, end_time) {
            return Err(GridError::InvalidInput(format!(
                "end time {} not after start time {}",
                end_time, start_time
            )));
        }

        let proposer_user = self.registry.query_user(proposer).await?;

        let vars: Variables = self.store.get_json_or_default(VARIABLES_KEY).await?;
        if proposer_user.user_credit < vars.credit_border {
            return Err(GridError::Unauthorized {
                required: vars.credit_border,
                actual: proposer_user.user_credit,
            });
        }

        let voter_map = match scope {
            Scope::Public => self.snapshot_public_voters().await?,
            Scope::League => self.snapshot_league_voters().await?,
        };

        Ok(BallotProposal {
            ballot_proposal_name: name.to_string(),
            proposer_name: proposer.to_string(),
            proposal_type: scope,
            number_of_voter: voter_map.len() as i64,
            voter_map,
            up_votes: 0,
            negative_votes: 0,
            number_of_voted: 0,
            state: ProposalState::Voting,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            variable: String::new(),
            value: 0,
            result: false,
        })
    }

    /// Cast an up or down vote with the voter's snapshotted weight, and
    /// award the participation credit in the same ledger transaction.
    pub async fn vote(&self, name: &str, voter: &str, up: bool) -> Result<BallotProposal> {
        let mut proposal = self.query(name).await?;

        let entry = proposal
            .voter_map
            .get_mut(voter)
            .ok_or_else(|| GridError::NotFound(voter.to_string()))?;
        if entry.voted {
            return Err(GridError::AlreadyVoted(voter.to_string()));
        }

        entry.voted = true;
        let weight = entry.user_credit;
        if up {
            proposal.up_votes += weight;
        } else {
            proposal.negative_votes += weight;
        }
        proposal.number_of_voted += 1;

        let vars: Variables = self.store.get_json_or_default(VARIABLES_KEY).await?;
        let mut voter_user = self.registry.query_user(voter).await?;
        voter_user.user_credit += vars.ballot_award_credit;

        let proposal_bytes = LedgerStore::encode(&proposal)?;
        let voter_bytes = LedgerStore::encode(&voter_user)?;
        self.store
            .put_atomic(&[(name, proposal_bytes), (voter, voter_bytes)])
            .await?;

        debug!(
            proposal = %name,
            voter = %voter,
            up,
            weight,
            voted = proposal.number_of_voted,
            "vote counted"
        );

        Ok(proposal)
    }

    /// Settle the proposal: passes only with a strict credit-weighted
    /// majority and strict participation of more than half the electorate.
    /// Idempotent absent intervening votes.
    pub async fn check(&self, name: &str) -> Result<BallotProposal> {
        let mut proposal = self.query(name).await?;

        Self::decide(&mut proposal);
        self.store.put_json(name, &proposal).await?;

        info!(
            proposal = %name,
            up = proposal.up_votes,
            down = proposal.negative_votes,
            voted = proposal.number_of_voted,
            eligible = proposal.number_of_voter,
            result = proposal.result,
            "📊 Ballot proposal checked"
        );

        Ok(proposal)
    }

    /// Pure outcome rule, shared with the change-variable engine.
    pub(crate) fn decide(proposal: &mut BallotProposal) {
        proposal.state = ProposalState::Done;
        proposal.result = proposal.negative_votes < proposal.up_votes
            && 2 * proposal.number_of_voted > proposal.number_of_voter;
    }

    pub async fn query(&self, name: &str) -> Result<BallotProposal> {
        self.store
            .get_json(name)
            .await?
            .ok_or_else(|| GridError::NotFound(name.to_string()))
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(name).await.map_err(Into::into)
    }

    async fn snapshot_public_voters(&self) -> Result<BTreeMap<String, Voter>> {
        let index = self.registry.user_index().await?;
        let mut voters = BTreeMap::new();
        for user_name in &index.users {
            let user = self.registry.query_user(user_name).await?;
            voters.insert(user.user_name.clone(), Voter::snapshot(&user));
        }
        Ok(voters)
    }

    async fn snapshot_league_voters(&self) -> Result<BTreeMap<String, Voter>> {
        let committee: Committee = self.store.get_json_or_default(COMMITTEE_KEY).await?;
        let mut voters = BTreeMap::new();
        for user_name in &committee.users {
            let user = self.registry.query_user(user_name).await?;
            voters.insert(user.user_name.clone(), Voter::snapshot(&user));
        }
        Ok(voters)
    }
}
