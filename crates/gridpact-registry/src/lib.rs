//! Identity registry for the gridpact community.
//!
//! Users are the leaf records every other engine validates against: ballots
//! and elections snapshot them, compacts settle credit and power through
//! them. Registration seeds credit from the live `Variables` record and
//! appends the name to the insertion-ordered user index, which is the
//! canonical snapshot order for the proposal engines.

use gridpact_ledger::{LedgerBackend, LedgerStore, USER_INDEX_KEY, VARIABLES_KEY};
use gridpact_types::{GridError, Result, Role, User, UserList, Variables};
use std::sync::Arc;
use tracing::{debug, info};

/// Engine for user records: registration, lookup, credit and power updates.
#[derive(Clone)]
pub struct IdentityRegistry {
    store: LedgerStore,
}

impl IdentityRegistry {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self {
            store: LedgerStore::new(backend),
        }
    }

    pub fn from_store(store: LedgerStore) -> Self {
        Self { store }
    }

    /// Register a new user with the configured initial credit and zero power.
    ///
    /// The name must be unused anywhere in the ledger namespace; user,
    /// proposal and compact names all share it.
    pub async fn register(&self, user_name: &str, user_role: &str) -> Result<User> {
        if self.store.exists(user_name).await? {
            return Err(GridError::AlreadyExists(user_name.to_string()));
        }

        let role: Role = user_role.parse()?;

        let vars: Variables = self.store.get_json_or_default(VARIABLES_KEY).await?;
        let user = User {
            user_name: user_name.to_string(),
            user_role: role,
            user_credit: vars.init_credit,
            power: 0,
        };

        let mut index: UserList = self.store.get_json_or_default(USER_INDEX_KEY).await?;
        index.users.push(user_name.to_string());

        let user_bytes = LedgerStore::encode(&user)?;
        let index_bytes = LedgerStore::encode(&index)?;
        self.store
            .put_atomic(&[(user_name, user_bytes), (USER_INDEX_KEY, index_bytes)])
            .await?;

        info!(
            user = %user_name,
            role = %role,
            credit = user.user_credit,
            "👤 User registered"
        );

        Ok(user)
    }

    pub async fn query_user(&self, user_name: &str) -> Result<User> {
        self.store
            .get_json(user_name)
            .await?
            .ok_or_else(|| GridError::NotFound(user_name.to_string()))
    }

    /// Existence predicate; absence is not a failure.
    pub async fn user_exists(&self, user_name: &str) -> Result<bool> {
        self.store.exists(user_name).await.map_err(Into::into)
    }

    /// Add `delta` (may be negative) to the user's credit. Unbounded in both
    /// directions; credit below zero is legal state.
    pub async fn change_credit(&self, user_name: &str, delta: i64) -> Result<User> {
        let mut user = self.query_user(user_name).await?;
        let before = user.user_credit;
        user.user_credit += delta;

        self.store.put_json(user_name, &user).await?;

        debug!(
            user = %user_name,
            delta,
            credit_before = before,
            credit_after = user.user_credit,
            "credit changed"
        );

        Ok(user)
    }

    /// Add `delta` to the user's cumulative power counter.
    pub async fn change_power(&self, user_name: &str, delta: i64) -> Result<User> {
        let mut user = self.query_user(user_name).await?;
        let before = user.power;
        user.power += delta;

        self.store.put_json(user_name, &user).await?;

        debug!(
            user = %user_name,
            delta,
            power_before = before,
            power_after = user.power,
            "power changed"
        );

        Ok(user)
    }

    /// The full registration-ordered user index; empty before any
    /// registration.
    pub async fn user_index(&self) -> Result<UserList> {
        self.store
            .get_json_or_default(USER_INDEX_KEY)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpact_ledger::MemoryLedger;

    fn registry() -> IdentityRegistry {
        IdentityRegistry::new(Arc::new(MemoryLedger::new()))
    }

    #[tokio::test]
    async fn register_seeds_initial_credit_and_zero_power() {
        let registry = registry();

        let alice = registry.register("alice", "powerUser").await.unwrap();
        assert_eq!(alice.user_credit, 100);
        assert_eq!(alice.power, 0);
        assert_eq!(alice.user_role, Role::PowerUser);

        let loaded = registry.query_user("alice").await.unwrap();
        assert_eq!(loaded, alice);
    }

    #[tokio::test]
    async fn register_rejects_taken_name_and_bad_role() {
        let registry = registry();
        registry.register("alice", "powerUser").await.unwrap();

        assert!(matches!(
            registry.register("alice", "admin").await,
            Err(GridError::AlreadyExists(_))
        ));
        assert!(matches!(
            registry.register("bob", "operator").await,
            Err(GridError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn failed_registration_leaves_no_index_entry() {
        let registry = registry();
        registry.register("alice", "powerUser").await.unwrap();

        let _ = registry.register("alice", "powerUser").await;
        let _ = registry.register("bob", "nonsense").await;

        assert_eq!(registry.user_index().await.unwrap().users, vec!["alice"]);
    }

    #[tokio::test]
    async fn index_preserves_registration_order() {
        let registry = registry();
        for name in ["carol", "alice", "bob"] {
            registry.register(name, "powerUser").await.unwrap();
        }

        assert_eq!(
            registry.user_index().await.unwrap().users,
            vec!["carol", "alice", "bob"]
        );
    }

    #[tokio::test]
    async fn credit_is_additive_and_may_go_negative() {
        let registry = registry();
        registry.register("alice", "powerUser").await.unwrap();

        registry.change_credit("alice", -150).await.unwrap();
        let alice = registry.query_user("alice").await.unwrap();
        assert_eq!(alice.user_credit, -50);

        registry.change_power("alice", 80).await.unwrap();
        registry.change_power("alice", -30).await.unwrap();
        let alice = registry.query_user("alice").await.unwrap();
        assert_eq!(alice.power, 50);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let registry = registry();

        assert!(matches!(
            registry.query_user("ghost").await,
            Err(GridError::NotFound(_))
        ));
        assert!(matches!(
            registry.change_credit("ghost", 1).await,
            Err(GridError::NotFound(_))
        ));
        assert!(!registry.user_exists("ghost").await.unwrap());
    }
}
