//! # Configured Policies
//!
//! The overdue-member decommission policy and circle id retirement.

mod common;

use common::*;
use rosca_circle::{CircleError, DecommissionPolicy, EngineConfig};

const GRACE: u64 = 3_600;

fn overdue_policy() -> EngineConfig {
    EngineConfig {
        decommission: DecommissionPolicy::OwnerOrOverdueMember { grace_secs: GRACE },
        ..EngineConfig::default()
    }
}

#[test]
fn member_may_force_overdue_incomplete_round() {
    let h = Harness::with_config(overdue_policy());
    let id = h.weekly_circle("stalled");
    h.deposit(&id, "ada");
    h.deposit(&id, "bob");

    let overdue_at = T0 + WEEK as i64 + GRACE as i64;

    h.set_time(overdue_at - 1);
    assert!(matches!(
        h.engine.decommission(&id, &acct("bob")),
        Err(CircleError::DecommissionNotEligible { .. })
    ));

    h.set_time(overdue_at);
    let refunds = h.engine.decommission(&id, &acct("bob")).unwrap();
    assert_eq!(refunds.len(), 2);
    assert_eq!(h.wallet("ada"), 1_000);
    assert_eq!(h.wallet("bob"), 1_000);
    assert!(h.engine.get_circle(&id).is_err());
}

#[test]
fn member_cannot_force_funded_round() {
    let h = Harness::with_config(overdue_policy());
    let id = h.weekly_circle("funded");
    for who in ["ada", "bob", "cy"] {
        h.deposit(&id, who);
    }
    h.set_time(T0 + 10 * WEEK as i64);
    assert!(matches!(
        h.engine.decommission(&id, &acct("cy")),
        Err(CircleError::DecommissionNotEligible { .. })
    ));
    assert_eq!(h.balances(&id), vec![100, 100, 100]);
}

#[test]
fn admin_and_outsider_under_overdue_policy() {
    let h = Harness::with_config(overdue_policy());
    let id = h.weekly_circle("admin-bypass");

    assert!(matches!(
        h.engine.decommission(&id, &acct("stranger")),
        Err(CircleError::NotOwner { .. })
    ));
    assert!(h.engine.decommission(&id, &acct("root")).is_ok());
}

#[test]
fn owner_only_ignores_overdue_state() {
    let h = Harness::new();
    let id = h.weekly_circle("strict");
    h.deposit(&id, "ada");
    h.set_time(T0 + 100 * WEEK as i64);
    assert!(matches!(
        h.engine.decommission(&id, &acct("ada")),
        Err(CircleError::NotOwner { .. })
    ));
}

#[test]
fn decommissioned_id_is_retired_by_default() {
    let h = Harness::new();
    let id = h.weekly_circle("phoenix");
    h.engine.decommission(&id, &acct("owner")).unwrap();

    let err = h
        .engine
        .create(&acct("owner"), definition("phoenix"))
        .unwrap_err();
    assert!(matches!(err, CircleError::RetiredCircleId(retired) if retired == id));
}

#[test]
fn reuse_allowed_when_retirement_disabled() {
    let h = Harness::with_config(EngineConfig {
        retire_decommissioned_ids: false,
        ..EngineConfig::default()
    });
    let id = h.weekly_circle("phoenix");
    h.deposit(&id, "ada");
    h.engine.decommission(&id, &acct("owner")).unwrap();

    let reborn = h
        .engine
        .create(&acct("owner"), definition("phoenix"))
        .unwrap();
    assert_eq!(reborn, id);
    // The new circle starts clean.
    assert_eq!(h.balances(&reborn), vec![0, 0, 0]);
    assert_eq!(h.engine.get_circle(&reborn).unwrap().current_index, 0);
}
