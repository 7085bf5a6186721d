//! Random operation sequences against one circle. Whatever the engine
//! accepts or rejects, per-member balances stay within the deposit amount,
//! the rotation index stays in range, and a payout always zeroes the round.

mod common;

use common::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Advance(u64),
    Deposit { payer: usize, beneficiary: usize, amount: u128 },
    Withdraw(usize),
}

const NAMES: [&str; 4] = ["ada", "bob", "cy", "eve"];
/// Payers include the engine's own custody account, which must never fund
/// a round.
const PAYERS: [&str; 5] = ["ada", "bob", "cy", "eve", "rosca:custody"];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..WEEK * 2).prop_map(Op::Advance),
        (0usize..PAYERS.len(), 0usize..4, 0u128..150).prop_map(|(payer, beneficiary, amount)| Op::Deposit {
            payer,
            beneficiary,
            amount
        }),
        (0usize..4).prop_map(Op::Withdraw),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn engine_invariants_hold(ops in prop::collection::vec(op(), 1..80)) {
        let h = Harness::new();
        let id = h.weekly_circle("prop");
        h.fund("eve", 10_000);
        let mut now = T0;

        for op in ops {
            match op {
                Op::Advance(secs) => {
                    now += secs as i64;
                    h.set_time(now);
                }
                Op::Deposit { payer, beneficiary, amount } => {
                    let _ = h.engine.deposit(&id, amount, &acct(PAYERS[payer]), &acct(NAMES[beneficiary]));
                }
                Op::Withdraw(caller) => {
                    let index = h.engine.get_circle(&id).unwrap().current_index;
                    if h.engine.withdraw(&id, &acct(NAMES[caller])).is_ok() {
                        prop_assert_eq!(h.balances(&id), vec![0, 0, 0]);
                        let after = h.engine.get_circle(&id).unwrap().current_index;
                        prop_assert_eq!(after, (index + 1) % 3);
                    }
                }
            }

            let circle = h.engine.get_circle(&id).unwrap();
            prop_assert!(circle.current_index < circle.members.len());
            let balances = h.balances(&id);
            prop_assert!(balances.iter().all(|b| *b <= 100));
            prop_assert!(balances.iter().sum::<u128>() <= 300);
            // Custody holds exactly the open round's contributions.
            prop_assert_eq!(h.vault(), balances.iter().sum::<u128>());
        }
    }
}
