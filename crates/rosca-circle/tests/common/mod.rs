//! Shared harness for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rosca_circle::{
    CircleDefinition, CircleEngine, Collaborators, CustodyGateway, EngineConfig, InMemoryCustody,
    MemorySink, StaticAdmins,
};
use rosca_core::{AccountId, Amount, AssetId, CircleId, ManualClock, Timestamp};

/// 2026-01-01T00:00:00Z.
pub const T0: i64 = 1_767_225_600;
pub const WEEK: u64 = 7 * 24 * 60 * 60;

pub fn acct(name: &str) -> AccountId {
    AccountId::new(name)
}

pub fn usdc() -> AssetId {
    AssetId::new("USDC")
}

pub fn at(secs: i64) -> Timestamp {
    Timestamp::from_epoch_secs(secs).expect("valid epoch seconds")
}

pub struct Harness {
    pub engine: Arc<CircleEngine>,
    pub custody: Arc<InMemoryCustody>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<MemorySink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let custody = Arc::new(InMemoryCustody::new(config.custody_account.clone()));
        Self::with_custody(config, custody.clone(), custody)
    }

    /// Build around an arbitrary gateway. `ledger` is the in-memory custody
    /// whose balances the tests inspect.
    pub fn with_custody(
        config: EngineConfig,
        gateway: Arc<dyn CustodyGateway>,
        ledger: Arc<InMemoryCustody>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(at(T0)));
        let sink = Arc::new(MemorySink::new());
        let engine = Arc::new(CircleEngine::new(
            config,
            Collaborators {
                custody: gateway,
                admin: Arc::new(StaticAdmins::new([acct("root")])),
                clock: clock.clone(),
                events: sink.clone(),
            },
        ));
        engine
            .set_allowed(&acct("root"), &usdc(), true)
            .expect("root may allowlist");
        Self {
            engine,
            custody: ledger,
            clock,
            sink,
        }
    }

    pub fn set_time(&self, secs: i64) {
        self.clock.set(at(secs));
    }

    pub fn fund(&self, who: &str, amount: Amount) {
        self.custody.mint(&usdc(), &acct(who), amount).expect("mint");
    }

    pub fn wallet(&self, who: &str) -> Amount {
        self.custody.balance_of(&usdc(), &acct(who))
    }

    pub fn vault(&self) -> Amount {
        self.custody.balance_of(&usdc(), &self.engine.config().custody_account)
    }

    /// Create the standard three-member weekly circle (ada, bob, cy; 100 per
    /// round; owner `owner`) and fund each member's wallet.
    pub fn weekly_circle(&self, name: &str) -> CircleId {
        for who in ["ada", "bob", "cy"] {
            self.fund(who, 1_000);
        }
        self.engine
            .create(&acct("owner"), definition(name))
            .expect("create")
    }

    pub fn deposit(&self, id: &CircleId, who: &str) -> Amount {
        self.engine
            .deposit(id, 100, &acct(who), &acct(who))
            .expect("deposit")
    }

    pub fn balances(&self, id: &CircleId) -> Vec<Amount> {
        self.engine.get_balances(id).expect("balances").balances
    }
}

pub fn definition(name: &str) -> CircleDefinition {
    CircleDefinition {
        name: name.to_string(),
        owner: acct("owner"),
        members: vec![acct("ada"), acct("bob"), acct("cy")],
        current_index: 0,
        deposit_amount: 100,
        token: usdc(),
        deposit_interval: WEEK,
        circle_start: at(T0),
        max_deposits: 1_000,
    }
}
