use crate::types::{Candidate, ElectionProposal, ProposalState, Voter};
use gridpact_ledger::{LedgerBackend, LedgerStore, COMMITTEE_KEY, VARIABLES_KEY};
use gridpact_registry::IdentityRegistry;
use gridpact_types::{timestamp, Committee, GridError, Result, Variables};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Snapshot credit above which a user is listed as a candidate.
///
/// Nomination is automatic at proposal creation; there is no opt-in or
/// opt-out.
pub const SELF_NOMINATION_CREDIT: i64 = 90;

/// Engine for committee elections.
///
/// Creation snapshots every registered user as a voter and every
/// sufficiently-credited user as a candidate; checking ranks the candidates
/// and overwrites the committee wholesale.
#[derive(Clone)]
pub struct ElectionEngine {
    store: LedgerStore,
    registry: IdentityRegistry,
}

impl ElectionEngine {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        let store = LedgerStore::new(backend);
        let registry = IdentityRegistry::from_store(store.clone());
        Self { store, registry }
    }

    pub async fn create(
        &self,
        name: &str,
        proposer: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<ElectionProposal> {
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

        let mut voter_map = BTreeMap::new();
        let mut candidate_map = BTreeMap::new();
        let index = self.registry.user_index().await?;
        for user_name in &index.users {
            let user = self.registry.query_user(user_name).await?;

            voter_map.insert(user.user_name.clone(), Voter::snapshot(&user));
            if user.user_credit > SELF_NOMINATION_CREDIT {
                candidate_map.insert(user.user_name.clone(), Candidate::nominate(&user));
            }
        }

        let proposal = ElectionProposal {
            election_proposal_name: name.to_string(),
            proposer_name: proposer.to_string(),
            candidate_map,
            voter_map,
            state: ProposalState::Voting,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        };

        self.store.put_json(name, &proposal).await?;

        info!(
            proposal = %name,
            proposer = %proposer,
            voters = proposal.voter_map.len(),
            candidates = proposal.candidate_map.len(),
            "🗳️ Election proposal created"
        );

        Ok(proposal)
    }

    /// Vote for a candidate with the voter's snapshotted weight; the
    /// participation award lands in the same ledger transaction.
    pub async fn vote(
        &self,
        name: &str,
        voter: &str,
        candidate: &str,
    ) -> Result<ElectionProposal> {
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

        let chosen = proposal
            .candidate_map
            .get_mut(candidate)
            .ok_or_else(|| GridError::NotFound(candidate.to_string()))?;
        chosen.votes += weight;

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
            candidate = %candidate,
            weight,
            "election vote counted"
        );

        Ok(proposal)
    }

    /// Settle the election: rank candidates by descending tally (ties broken
    /// by ascending name, so the outcome depends only on final tallies) and
    /// overwrite the committee with the top seats.
    pub async fn check(&self, name: &str) -> Result<Committee> {
        let mut proposal = self.query(name).await?;

        proposal.state = ProposalState::Done;

        let mut ranked: Vec<&Candidate> = proposal.candidate_map.values().collect();
        ranked.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.candidate_name.cmp(&b.candidate_name))
        });

        let vars: Variables = self.store.get_json_or_default(VARIABLES_KEY).await?;
        let seats = vars.committee_member_number.max(0) as usize;
        let committee = Committee {
            users: ranked
                .iter()
                .take(seats)
                .map(|c| c.candidate_name.clone())
                .collect(),
        };

        let proposal_bytes = LedgerStore::encode(&proposal)?;
        let committee_bytes = LedgerStore::encode(&committee)?;
        self.store
            .put_atomic(&[(name, proposal_bytes), (COMMITTEE_KEY, committee_bytes)])
            .await?;

        info!(
            proposal = %name,
            members = ?committee.users,
            "🏛️ Committee elected"
        );

        Ok(committee)
    }

    pub async fn query(&self, name: &str) -> Result<ElectionProposal> {
        self.store
            .get_json(name)
            .await?
            .ok_or_else(|| GridError::NotFound(name.to_string()))
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(name).await.map_err(Into::into)
    }

    /// The current committee; empty before the first election check.
    pub async fn query_committee(&self) -> Result<Committee> {
        self.store
            .get_json_or_default(COMMITTEE_KEY)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpact_ledger::MemoryLedger;

    async fn setup(users: &[&str]) -> (ElectionEngine, IdentityRegistry) {
        let backend: Arc<dyn LedgerBackend> = Arc::new(MemoryLedger::new());
        let registry = IdentityRegistry::new(Arc::clone(&backend));
        for name in users {
            registry.register(name, "powerUser").await.unwrap();
        }
        (ElectionEngine::new(backend), registry)
    }

    fn window() -> (&'static str, &'static str) {
        ("2024-01-01 00:00:00", "2024-01-02 00:00:00")
    }

    #[tokio::test]
    async fn create_nominates_only_above_threshold() {
        let (elections, registry) = setup(&["alice", "bob", "carol"]).await;

        // Exactly at the threshold is not enough; strictly above is
        registry.change_credit("bob", -10).await.unwrap(); // 90
        registry.change_credit("carol", -11).await.unwrap(); // 89

        let (start, end) = window();
        let proposal = elections.create("e1", "alice", start, end).await.unwrap();

        assert_eq!(proposal.voter_map.len(), 3);
        assert_eq!(proposal.candidate_map.len(), 1);
        assert!(proposal.candidate_map.contains_key("alice"));
    }

    #[tokio::test]
    async fn vote_tallies_snapshot_weight_per_candidate() {
        let (elections, registry) = setup(&["alice", "bob", "carol"]).await;
        let (start, end) = window();
        elections.create("e1", "alice", start, end).await.unwrap();

        elections.vote("e1", "alice", "bob").await.unwrap();
        let proposal = elections.vote("e1", "carol", "bob").await.unwrap();

        assert_eq!(proposal.candidate_map["bob"].votes, 200);
        assert!(proposal.voter_map["alice"].voted);

        // Voters earned the participation award
        assert_eq!(registry.query_user("alice").await.unwrap().user_credit, 106);
    }

    #[tokio::test]
    async fn vote_guards() {
        let (elections, registry) = setup(&["alice", "bob"]).await;
        let (start, end) = window();
        elections.create("e1", "alice", start, end).await.unwrap();

        elections.vote("e1", "alice", "bob").await.unwrap();
        assert!(matches!(
            elections.vote("e1", "alice", "bob").await,
            Err(GridError::AlreadyVoted(_))
        ));

        // Not a candidate: registered too late for the snapshot
        registry.register("dave", "powerUser").await.unwrap();
        assert!(matches!(
            elections.vote("e1", "bob", "dave").await,
            Err(GridError::NotFound(_))
        ));

        // A failed vote must leave the voter able to vote
        let proposal = elections.query("e1").await.unwrap();
        assert!(!proposal.voter_map["bob"].voted);
    }

    #[tokio::test]
    async fn check_ranks_by_tally_then_name() {
        let (elections, _) = setup(&["alice", "bob", "carol", "dave", "erin", "frank", "grace"])
            .await;
        let (start, end) = window();
        elections.create("e1", "alice", start, end).await.unwrap();

        // bob: 200, carol: 100, the rest: 0
        elections.vote("e1", "alice", "bob").await.unwrap();
        elections.vote("e1", "dave", "bob").await.unwrap();
        elections.vote("e1", "erin", "carol").await.unwrap();

        let committee = elections.check("e1").await.unwrap();

        // Five seats by default; zero-vote candidates rank by name
        assert_eq!(
            committee.users,
            vec!["bob", "carol", "alice", "dave", "erin"]
        );

        let proposal = elections.query("e1").await.unwrap();
        assert_eq!(proposal.state, ProposalState::Done);
    }

    #[tokio::test]
    async fn committee_is_independent_of_vote_order() {
        let (start, end) = window();
        let mut committees = Vec::new();

        for votes in [
            [("alice", "bob"), ("carol", "bob"), ("dave", "erin")],
            [("dave", "erin"), ("alice", "bob"), ("carol", "bob")],
            [("carol", "bob"), ("dave", "erin"), ("alice", "bob")],
        ] {
            let (elections, _) = setup(&["alice", "bob", "carol", "dave", "erin"]).await;
            elections.create("e1", "alice", start, end).await.unwrap();
            for (voter, candidate) in votes {
                elections.vote("e1", voter, candidate).await.unwrap();
            }
            committees.push(elections.check("e1").await.unwrap());
        }

        assert_eq!(committees[0], committees[1]);
        assert_eq!(committees[1], committees[2]);
    }

    #[tokio::test]
    async fn committee_is_capped_at_member_number() {
        let (elections, _) = setup(&[
            "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi",
        ])
        .await;
        let (start, end) = window();
        elections.create("e1", "alice", start, end).await.unwrap();

        let committee = elections.check("e1").await.unwrap();
        assert_eq!(committee.users.len(), 5);
    }

    #[tokio::test]
    async fn committee_is_overwritten_wholesale() {
        let (elections, registry) = setup(&["alice", "bob", "carol"]).await;
        let (start, end) = window();

        elections.create("e1", "alice", start, end).await.unwrap();
        elections.check("e1").await.unwrap();
        assert_eq!(elections.query_committee().await.unwrap().users.len(), 3);

        // Drop bob below the nomination threshold before the next election
        registry.change_credit("bob", -50).await.unwrap();
        elections.create("e2", "alice", start, end).await.unwrap();
        let committee = elections.check("e2").await.unwrap();

        assert_eq!(committee.users.len(), 2);
        assert!(!committee.users.contains(&"bob".to_string()));
        assert_eq!(elections.query_committee().await.unwrap(), committee);
    }
}
