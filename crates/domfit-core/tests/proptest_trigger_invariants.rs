//! Property-based invariant tests for trigger gating.
//!
//! 1. Only an idle gate starts a pass; a running gate never starts another.
//! 2. Drop policy never yields a follow-up.
//! 3. Trailing policy yields a follow-up iff a non-content trigger arrived
//!    during the pass, and it is the latest such trigger.
//! 4. The mailbox holds at most one trigger, and never loses a size or
//!    parameter trigger to a content change.

use domfit_core::trigger::{
    CoalescePolicy, TriggerDisposition, TriggerGate, TriggerSink, TriggerSource,
};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Offer(TriggerSource),
    Complete,
}

fn source_strategy() -> impl Strategy<Value = TriggerSource> {
    prop_oneof![
        Just(TriggerSource::SizeChange),
        Just(TriggerSource::ContentChange),
        Just(TriggerSource::ParamUpdate),
        Just(TriggerSource::Manual),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => source_strategy().prop_map(Op::Offer),
        1 => Just(Op::Complete),
    ]
}

fn policy_strategy() -> impl Strategy<Value = CoalescePolicy> {
    prop_oneof![Just(CoalescePolicy::Drop), Just(CoalescePolicy::Trailing)]
}

proptest! {
    #[test]
    fn gate_never_overlaps(policy in policy_strategy(), ops in prop::collection::vec(op_strategy(), 0..64)) {
        let mut gate = TriggerGate::new(policy);
        let mut running = false;
        let mut expected_followup: Option<TriggerSource> = None;

        for op in ops {
            match op {
                Op::Offer(source) => {
                    let disposition = gate.offer(source);
                    if running {
                        prop_assert_ne!(disposition, TriggerDisposition::Started);
                        if policy == CoalescePolicy::Trailing && !source.is_self_induced() {
                            prop_assert_eq!(disposition, TriggerDisposition::Deferred);
                            expected_followup = Some(source);
                        } else {
                            prop_assert_eq!(disposition, TriggerDisposition::Dropped);
                        }
                    } else {
                        prop_assert_eq!(disposition, TriggerDisposition::Started);
                        running = true;
                    }
                }
                Op::Complete => {
                    let followup = gate.complete();
                    if policy == CoalescePolicy::Drop {
                        prop_assert_eq!(followup, None);
                    }
                    prop_assert_eq!(followup, expected_followup.take());
                    running = false;
                }
            }
            prop_assert_eq!(gate.is_running(), running);
        }
    }
}

proptest! {
    #[test]
    fn mailbox_keeps_strongest_latest(sources in prop::collection::vec(source_strategy(), 1..32)) {
        let sink = TriggerSink::new();
        for source in &sources {
            sink.notify(*source);
        }

        let last_strong = sources.iter().rev().find(|s| !s.is_self_induced()).copied();
        let expected = last_strong.unwrap_or(TriggerSource::ContentChange);
        prop_assert_eq!(sink.take(), Some(expected));
        prop_assert_eq!(sink.take(), None);
        prop_assert_eq!(sink.received(), sources.len() as u64);
        prop_assert_eq!(sink.overwritten(), sources.len() as u64 - 1);
    }
}
