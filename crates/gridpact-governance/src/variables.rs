use crate::ballot::BallotEngine;
use crate::types::{BallotProposal, Scope};
use gridpact_ledger::{LedgerBackend, LedgerStore, VARIABLES_KEY};
use gridpact_types::{Result, VariableKey, Variables};
use std::sync::Arc;
use tracing::info;

/// Read access to the persisted `Variables` record.
///
/// The record lives under a singleton ledger key so an enacted change is
/// visible to every replica; before the first enacted change the key is
/// absent and defaults apply.
#[derive(Clone)]
pub struct VariableStore {
    store: LedgerStore,
}

impl VariableStore {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self {
            store: LedgerStore::new(backend),
        }
    }

    pub async fn current(&self) -> Result<Variables> {
        self.store
            .get_json_or_default(VARIABLES_KEY)
            .await
            .map_err(Into::into)
    }
}

/// Engine for change-variable proposals.
///
/// A change-variable proposal is an ordinary ballot carrying a
/// `{variable, value}` payload; when the ballot passes its check, the value
/// is applied to the persisted `Variables` record in the same ledger
/// transaction as the proposal's settlement.
#[derive(Clone)]
pub struct VariableEngine {
    store: LedgerStore,
    ballots: BallotEngine,
}

impl VariableEngine {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        let store = LedgerStore::new(Arc::clone(&backend));
        Self {
            store,
            ballots: BallotEngine::new(backend),
        }
    }

    /// Create a ballot proposing `variable = value`.
    ///
    /// The variable name must be one of the whitelisted tunables and the
    /// value must be structurally valid for it; both are checked before any
    /// write.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_change_proposal(
        &self,
        name: &str,
        proposer: &str,
        scope: Scope,
        start_time: &str,
        end_time: &str,
        variable: &str,
        value: i64,
    ) -> Result<BallotProposal> {
        let key: VariableKey = variable.parse()?;
        key.validate(value)?;

        let mut proposal = self
            .ballots
            .build(name, proposer, scope, start_time, end_time)
            .await?;
        proposal.variable = key.as_str().to_string();
        proposal.value = value;

        self.store.put_json(name, &proposal).await?;

        info!(
            proposal = %name,
            proposer = %proposer,
            variable = %key,
            value,
            "🗳️ Change-variable proposal created"
        );

        Ok(proposal)
    }

    /// Settle the underlying ballot and, if it passed, apply the proposed
    /// value. The proposal's Done write and the variable write commit
    /// together or not at all.
    pub async fn check_change_proposal(&self, name: &str) -> Result<BallotProposal> {
        let mut proposal = self.ballots.query(name).await?;

        BallotEngine::decide(&mut proposal);

        if proposal.result && !proposal.variable.is_empty() {
            let key: VariableKey = proposal.variable.parse()?;
            let mut vars: Variables = self.store.get_json_or_default(VARIABLES_KEY).await?;
            key.apply(&mut vars, proposal.value);

            let proposal_bytes = LedgerStore::encode(&proposal)?;
            let vars_bytes = LedgerStore::encode(&vars)?;
            self.store
                .put_atomic(&[(name, proposal_bytes), (VARIABLES_KEY, vars_bytes)])
                .await?;

            info!(
                proposal = %name,
                variable = %key,
                value = proposal.value,
                "📝 Variable updated via governance"
            );
        } else {
            self.store.put_json(name, &proposal).await?;
        }

        Ok(proposal)
    }
}
