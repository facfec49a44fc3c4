use crate::types::{Compact, CompactState};
use gridpact_ledger::{LedgerBackend, LedgerStore, VARIABLES_KEY};
use gridpact_registry::IdentityRegistry;
use gridpact_types::{timestamp, GridError, Result, User, Variables};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Engine for the compact negotiation state machine.
///
/// Every operation re-reads the compact, checks the exact state it acts on,
/// and persists the transition; a state mismatch fails without touching the
/// ledger. Settlement writes the compact and all three party records in one
/// transaction.
#[derive(Clone)]
pub struct TradeEngine {
    store: LedgerStore,
    registry: IdentityRegistry,
}

impl TradeEngine {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        let store = LedgerStore::new(backend);
        let registry = IdentityRegistry::from_store(store.clone());
        Self { store, registry }
    }

    /// Open a compact for `transaction` volume at an asking `price`.
    pub async fn commit(
        &self,
        compact_id: &str,
        power_user_name: &str,
        transaction: i64,
        price: f64,
        start_time: &str,
        end_time: &str,
    ) -> Result<Compact> {
        if !timestamp::precedes(start_time, end_time) {
            return Err(GridError::InvalidInput(format!(
                "end time {} not after start time {}",
                end_time, start_time
            )));
        }

        if self.store.exists(compact_id).await? {
            return Err(GridError::AlreadyExists(compact_id.to_string()));
        }

        let consumer = self.registry.query_user(power_user_name).await?;
        self.require_credit(&consumer).await?;

        let compact = Compact {
            compact_id: compact_id.to_string(),
            state: CompactState::Committing,
            power_plant_name: String::new(),
            power_user_name: power_user_name.to_string(),
            admin_name: String::new(),
            transaction,
            price,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        };

        self.store.put_json(compact_id, &compact).await?;

        info!(
            compact = %compact_id,
            consumer = %power_user_name,
            volume = transaction,
            price,
            "⚡ Compact opened"
        );

        Ok(compact)
    }

    /// A plant bids on an open compact at `price`.
    pub async fn bid(
        &self,
        compact_id: &str,
        power_plant_name: &str,
        price: f64,
    ) -> Result<Compact> {
        let plant = self.registry.query_user(power_plant_name).await?;
        self.require_credit(&plant).await?;

        let mut compact = self.query(compact_id).await?;
        Self::guard(&compact, CompactState::Committing)?;

        compact.power_plant_name = power_plant_name.to_string();
        compact.price = price;
        compact.state = CompactState::Biding;

        self.store.put_json(compact_id, &compact).await?;

        debug!(compact = %compact_id, plant = %power_plant_name, price, "bid placed");

        Ok(compact)
    }

    /// The consumer rejects the standing bid and re-opens at `new_price`.
    pub async fn reject(&self, compact_id: &str, new_price: f64) -> Result<Compact> {
        let mut compact = self.query(compact_id).await?;
        Self::guard(&compact, CompactState::Biding)?;

        compact.power_plant_name = String::new();
        compact.price = new_price;
        compact.state = CompactState::Committing;

        self.store.put_json(compact_id, &compact).await?;

        debug!(compact = %compact_id, new_price, "bid rejected");

        Ok(compact)
    }

    /// The plant withdraws its bid; the asking price stands.
    pub async fn cancel_bid(&self, compact_id: &str) -> Result<Compact> {
        let mut compact = self.query(compact_id).await?;
        Self::guard(&compact, CompactState::Biding)?;

        compact.power_plant_name = String::new();
        compact.state = CompactState::Committing;

        self.store.put_json(compact_id, &compact).await?;

        debug!(compact = %compact_id, "bid cancelled");

        Ok(compact)
    }

    /// The consumer accepts the standing bid.
    pub async fn accept(&self, compact_id: &str) -> Result<Compact> {
        let mut compact = self.query(compact_id).await?;
        Self::guard(&compact, CompactState::Biding)?;

        compact.state = CompactState::Accepted;

        self.store.put_json(compact_id, &compact).await?;

        debug!(compact = %compact_id, "bid accepted");

        Ok(compact)
    }

    /// An admin ratifies the accepted trade.
    pub async fn deal(&self, compact_id: &str, admin_name: &str) -> Result<Compact> {
        let admin = self.registry.query_user(admin_name).await?;
        self.require_credit(&admin).await?;

        let mut compact = self.query(compact_id).await?;
        Self::guard(&compact, CompactState::Accepted)?;

        compact.admin_name = admin_name.to_string();
        compact.state = CompactState::Deal;

        self.store.put_json(compact_id, &compact).await?;

        info!(compact = %compact_id, admin = %admin_name, "🤝 Deal ratified");

        Ok(compact)
    }

    /// The consumer withdraws an open compact. Terminal.
    pub async fn cancel_commit(&self, compact_id: &str) -> Result<Compact> {
        let mut compact = self.query(compact_id).await?;
        Self::guard(&compact, CompactState::Committing)?;

        compact.state = CompactState::CancelCommit;

        self.store.put_json(compact_id, &compact).await?;

        debug!(compact = %compact_id, "commit cancelled");

        Ok(compact)
    }

    /// Settle a ratified trade against metered volumes.
    ///
    /// Each side earns a tiered credit reward on the volume it actually
    /// moved, capped at the committed volume: falling short earns the lower
    /// tier, overdelivery earns no more than the commitment. Cumulative
    /// power rises by `used` for the consumer, `supplied` for the plant, and
    /// the sum for the ratifying admin. All four records commit atomically.
    pub async fn check(&self, compact_id: &str, used: i64, supplied: i64) -> Result<Compact> {
        let mut compact = self.query(compact_id).await?;
        Self::guard(&compact, CompactState::Deal)?;

        let vars: Variables = self.store.get_json_or_default(VARIABLES_KEY).await?;
        let consumer_reward = vars.award_credit(used.min(compact.transaction));
        let plant_reward = vars.award_credit(supplied.min(compact.transaction));

        // Deltas keyed by name so a user acting in two roles settles both.
        let mut deltas: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        let consumer = deltas.entry(compact.power_user_name.clone()).or_default();
        consumer.0 += consumer_reward;
        consumer.1 += used;
        let plant = deltas.entry(compact.power_plant_name.clone()).or_default();
        plant.0 += plant_reward;
        plant.1 += supplied;
        let admin = deltas.entry(compact.admin_name.clone()).or_default();
        admin.1 += supplied + used;

        let mut writes: Vec<(&str, Vec<u8>)> = Vec::with_capacity(deltas.len() + 1);
        for (name, (credit_delta, power_delta)) in &deltas {
            let mut user = self.registry.query_user(name).await?;
            user.user_credit += credit_delta;
            user.power += power_delta;
            writes.push((name.as_str(), LedgerStore::encode(&user)?));
        }

        compact.state = CompactState::Done;
        writes.push((compact_id, LedgerStore::encode(&compact)?));

        self.store.put_atomic(&writes).await?;

        info!(
            compact = %compact_id,
            used,
            supplied,
            consumer_reward,
            plant_reward,
            "⚡ Compact settled"
        );

        Ok(compact)
    }

    pub async fn query(&self, compact_id: &str) -> Result<Compact> {
        self.store
            .get_json(compact_id)
            .await?
            .ok_or_else(|| GridError::NotFound(compact_id.to_string()))
    }

    pub async fn exists(&self, compact_id: &str) -> Result<bool> {
        self.store.exists(compact_id).await.map_err(Into::into)
    }

    async fn require_credit(&self, user: &User) -> Result<()> {
        let vars: Variables = self.store.get_json_or_default(VARIABLES_KEY).await?;
        if user.user_credit < vars.credit_border {
            return Err(GridError::Unauthorized {
                required: vars.credit_border,
                actual: user.user_credit,
            });
        }
        Ok(())
    }

    fn guard(compact: &Compact, expected: CompactState) -> Result<()> {
        if compact.state != expected {
            return Err(GridError::InvalidState {
                expected: expected.to_string(),
                found: compact.state.to_string(),
            });
        }
        Ok(())
    }
}
