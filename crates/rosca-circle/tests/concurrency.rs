//! Many threads depositing into the same circle at once.

mod common;

use std::thread;

use common::*;
use rosca_circle::{CircleError, DepositRejection};

#[test]
fn concurrent_deposits_never_exceed_amount() {
    let h = Harness::new();
    let id = h.weekly_circle("crowd");

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let engine = h.engine.clone();
            thread::spawn(move || {
                let who = acct(["ada", "bob", "cy"][n % 3]);
                let mut accepted = 0u128;
                for _ in 0..20 {
                    match engine.deposit(&id, 10, &who, &who) {
                        Ok(_) => accepted += 10,
                        Err(CircleError::InvalidDeposit {
                            reason: DepositRejection::ExceedsDepositAmount,
                            ..
                        }) => {}
                        Err(e) => panic!("unexpected: {e}"),
                    }
                }
                accepted
            })
        })
        .collect();

    let accepted: u128 = handles.into_iter().map(|t| t.join().unwrap()).sum();

    assert_eq!(accepted, 300);
    assert_eq!(h.balances(&id), vec![100, 100, 100]);
    assert_eq!(h.vault(), 300);
    assert!(h.engine.is_withdrawable(&id).unwrap());
}

#[test]
fn one_payout_per_round_under_contention() {
    let h = Harness::new();
    let id = h.weekly_circle("race");
    for who in ["ada", "bob", "cy"] {
        h.deposit(&id, who);
    }

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let engine = h.engine.clone();
            thread::spawn(move || engine.withdraw(&id, &acct("ada")).is_ok())
        })
        .collect();
    let wins = handles
        .into_iter()
        .map(|t| t.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(wins, 1);
    assert_eq!(h.wallet("ada"), 1_200);
    assert_eq!(h.vault(), 0);
}
