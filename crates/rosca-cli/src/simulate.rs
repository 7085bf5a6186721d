//! # Simulate Subcommand
//!
//! Runs a [`Scenario`] against an engine wired to [`InMemoryCustody`] and a
//! [`ManualClock`]. Each step's outcome is checked against its expectation;
//! any mismatch makes the command exit with status 1.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use rosca_circle::{
    BalanceSheet, CircleEngine, CircleError, CircleEvent, Collaborators, EngineConfig, EventSink,
    InMemoryCustody, MemorySink, StaticAdmins, TracingSink,
};
use rosca_core::{AccountId, Amount, CircleId, ManualClock};
use serde::Serialize;

use crate::scenario::{Expectation, Scenario, Step};

/// Arguments for the simulate subcommand.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the scenario YAML file.
    pub scenario: PathBuf,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,
}

/// Outcome of one scenario step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub action: &'static str,
    pub expected: Expectation,
    pub ok: bool,
    /// Result value on success, error message on failure.
    pub detail: String,
}

impl StepOutcome {
    pub fn matches(&self) -> bool {
        self.ok == (self.expected == Expectation::Ok)
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub circle: CircleId,
    pub steps: Vec<StepOutcome>,
    /// Absent once the circle has been decommissioned.
    pub balances: Option<BalanceSheet>,
    /// Final custody balance of every account named in the scenario.
    pub wallets: BTreeMap<String, Amount>,
    pub events: Vec<CircleEvent>,
    pub mismatches: usize,
}

/// Records events for the report and logs them.
#[derive(Default)]
struct ReportSink {
    memory: MemorySink,
    tracing: TracingSink,
}

impl EventSink for ReportSink {
    fn emit(&self, event: &CircleEvent) {
        self.tracing.emit(event);
        self.memory.emit(event);
    }
}

pub fn run_simulate(args: &SimulateArgs) -> Result<u8> {
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read {}", args.scenario.display()))?;
    let scenario = Scenario::from_yaml(&text)
        .with_context(|| format!("failed to parse {}", args.scenario.display()))?;

    let report = simulate(&scenario)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    if report.mismatches > 0 {
        tracing::error!(mismatches = report.mismatches, "scenario expectations not met");
        return Ok(1);
    }
    Ok(0)
}

/// Run a scenario to completion.
///
/// Setup failures (bad config, circle creation refused) are errors. Step
/// failures are recorded in the report.
pub fn simulate(scenario: &Scenario) -> Result<Report> {
    let config = match &scenario.config {
        Some(config) => config.clone(),
        None => EngineConfig::from_env()?,
    };
    let start = scenario.start.unwrap_or(scenario.circle.circle_start);

    let custody = Arc::new(InMemoryCustody::new(config.custody_account.clone()));
    let clock = Arc::new(ManualClock::new(start));
    let sink = Arc::new(ReportSink::default());
    let engine = CircleEngine::new(
        config,
        Collaborators {
            custody: custody.clone(),
            admin: Arc::new(StaticAdmins::new(scenario.admins.iter().cloned())),
            clock: clock.clone(),
            events: sink.clone(),
        },
    );

    if !scenario.assets.is_empty() {
        let Some(admin) = scenario.admins.first() else {
            bail!("scenario allowlists assets but names no admin");
        };
        for asset in &scenario.assets {
            engine.set_allowed(admin, asset, true)?;
        }
    }
    for holding in &scenario.balances {
        custody.mint(&holding.asset, &holding.account, Amount::from(holding.amount))?;
    }

    let circle = &scenario.circle;
    let id = engine
        .create(&circle.owner, circle.to_definition())
        .with_context(|| format!("failed to create circle {:?}", circle.name))?;

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (n, step) in scenario.steps.iter().enumerate() {
        let result = match step {
            Step::Advance { secs } => clock
                .advance(*secs)
                .map(|now| now.to_iso8601())
                .map_err(|e| e.to_string()),
            Step::Deposit {
                payer,
                beneficiary,
                amount,
                ..
            } => engine
                .deposit(
                    &id,
                    Amount::from(*amount),
                    payer,
                    beneficiary.as_ref().unwrap_or(payer),
                )
                .map(|balance| format!("balance {balance}"))
                .map_err(describe),
            Step::Withdraw { caller, .. } => engine
                .withdraw(&id, caller)
                .map(|paid| format!("paid {paid}"))
                .map_err(describe),
            Step::Decommission { caller, .. } => engine
                .decommission(&id, caller)
                .map(|refunds| format!("{} refunds", refunds.len()))
                .map_err(describe),
        };
        let outcome = StepOutcome {
            step: n + 1,
            action: step.action(),
            expected: step.expectation(),
            ok: result.is_ok(),
            detail: result.unwrap_or_else(|e| e),
        };
        if !outcome.matches() {
            tracing::warn!(step = outcome.step, action = outcome.action, detail = %outcome.detail, "unexpected step outcome");
        }
        steps.push(outcome);
    }

    let balances = match engine.get_balances(&id) {
        Ok(sheet) => Some(sheet),
        Err(CircleError::CircleNotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let mut wallets = BTreeMap::new();
    for account in named_accounts(scenario) {
        wallets.insert(
            account.as_str().to_string(),
            custody.balance_of(&circle.token, &account),
        );
    }
    wallets.insert(
        custody.vault().as_str().to_string(),
        custody.balance_of(&circle.token, custody.vault()),
    );

    let mismatches = steps.iter().filter(|s| !s.matches()).count();
    Ok(Report {
        circle: id,
        steps,
        balances,
        wallets,
        events: sink.memory.events(),
        mismatches,
    })
}

fn describe(e: CircleError) -> String {
    format!("{:?}: {e}", e.kind())
}

fn named_accounts(scenario: &Scenario) -> Vec<AccountId> {
    let mut accounts: Vec<AccountId> = scenario
        .circle
        .members
        .iter()
        .chain(std::iter::once(&scenario.circle.owner))
        .chain(scenario.balances.iter().map(|h| &h.account))
        .cloned()
        .collect();
    for step in &scenario.steps {
        if let Step::Deposit { payer, .. } = step {
            accounts.push(payer.clone());
        }
    }
    accounts.sort();
    accounts.dedup();
    accounts
}
