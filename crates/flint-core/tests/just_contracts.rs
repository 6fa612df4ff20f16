//! 即时 Sender 的契约测试：终态唯一、签名推导、惰性求值与观测序列。

use core::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use flint_core::prelude::*;
use flint_core::signal::SignalKind;
use flint_core::test_stubs::{Outcome, OutcomeCell, RecordingObserver, RecordingReceiver};
use flint_core::{just_error_result_of, just_result_of};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum ProbeError {
    #[error("探针错误：{0}")]
    Definitely(&'static str),
}

#[test]
fn just_delivers_value_exactly_once() {
    let cell = OutcomeCell::<u32, Infallible>::new();
    let mut op = just(41_u32).connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(cell.take_exactly_one(), Outcome::Value(41));
}

#[test]
fn just_carries_tuple_payloads() {
    let cell = OutcomeCell::<(u32, &'static str), Infallible>::new();
    let mut op = just((7_u32, "seven")).connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(cell.take_exactly_one(), Outcome::Value((7, "seven")));
}

#[test]
fn just_error_delivers_error_exactly_once() {
    let cell = OutcomeCell::<Infallible, ProbeError>::new();
    let mut op = just_error(ProbeError::Definitely("boom"))
        .connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(
        cell.take_exactly_one(),
        Outcome::Error(ProbeError::Definitely("boom"))
    );
}

#[test]
fn just_stopped_delivers_stopped_exactly_once() {
    let cell = OutcomeCell::<Infallible, Infallible>::new();
    let mut op = just_stopped().connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(cell.take_exactly_one(), Outcome::Stopped);
}

#[test]
fn second_start_is_a_no_op() {
    let cell = OutcomeCell::<u32, Infallible>::new();
    let mut op = just(1_u32).connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    start(&mut op);
    assert_eq!(cell.count(), 1);
}

#[test]
fn cloneable_payload_makes_sender_multishot() {
    let sender = just(5_u32);
    let first = OutcomeCell::<u32, Infallible>::new();
    let second = OutcomeCell::<u32, Infallible>::new();

    let mut op = sender.connect_ref(RecordingReceiver::new(first.clone(), EmptyEnv));
    start(&mut op);
    let mut op = sender.connect_ref(RecordingReceiver::new(second.clone(), EmptyEnv));
    start(&mut op);

    assert_eq!(first.take_exactly_one(), Outcome::Value(5));
    assert_eq!(second.take_exactly_one(), Outcome::Value(5));
}

#[test]
fn declared_signatures_are_single_and_exact() {
    let just_sigs = <Just<u32> as Sender>::completions::<EmptyEnv>();
    assert!(just_sigs.allows(SignalKind::Value));
    assert!(!just_sigs.allows(SignalKind::Error));
    assert!(!just_sigs.allows(SignalKind::Stopped));

    let error_sigs = <JustError<ProbeError> as Sender>::completions::<EmptyEnv>();
    assert!(error_sigs.allows(SignalKind::Error));
    assert!(!error_sigs.allows(SignalKind::Value));

    let stopped_sigs = <JustStopped as Sender>::completions::<EmptyEnv>();
    assert!(stopped_sigs.allows(SignalKind::Stopped));
    assert!(!stopped_sigs.allows(SignalKind::Value));

    assert!(<Just<u32> as Sender>::COMPLETES_SYNCHRONOUSLY);
    assert!(<JustError<ProbeError> as Sender>::COMPLETES_SYNCHRONOUSLY);
    assert!(<JustStopped as Sender>::COMPLETES_SYNCHRONOUSLY);
}

#[test]
fn observer_sees_start_then_terminal_event() {
    let observer = RecordingObserver::new();
    let env = TokenEnv::with_observer(NeverStopToken, observer.clone());
    let cell = OutcomeCell::<u32, Infallible>::new();
    let mut op = just(3_u32).connect(RecordingReceiver::new(cell.clone(), env));
    start(&mut op);

    assert_eq!(
        observer.events(),
        [
            (ProtocolEvent::Start, "just"),
            (ProtocolEvent::SetValue, "just"),
        ]
    );
}

#[test]
fn result_of_defers_all_steps_until_start() {
    let hits = Arc::new(AtomicU32::new(0));
    let effect = hits.clone();
    let value = hits.clone();
    let sender = just_result_of![
        move || {
            effect.fetch_add(1, Ordering::SeqCst);
        },
        move || value.fetch_add(1, Ordering::SeqCst) + 10,
    ];

    let cell = OutcomeCell::<u32, Infallible>::new();
    let mut op = sender.connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    assert_eq!(hits.load(Ordering::SeqCst), 0, "连接不得执行任何步骤");

    start(&mut op);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(cell.take_exactly_one(), Outcome::Value(11));
}

#[test]
fn result_of_payload_shapes_follow_value_step_count() {
    // 零个取值步骤 → `()`。
    let flag = Arc::new(AtomicU32::new(0));
    let observed = flag.clone();
    let cell = OutcomeCell::<(), Infallible>::new();
    let mut op = just_result_of![move || {
        observed.store(1, Ordering::SeqCst);
    }]
    .connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(cell.take_exactly_one(), Outcome::Value(()));
    assert_eq!(flag.load(Ordering::SeqCst), 1);

    // 一个取值步骤 → 裸值。
    let cell = OutcomeCell::<u64, Infallible>::new();
    let mut op = just_result_of![|| 9_u64].connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(cell.take_exactly_one(), Outcome::Value(9));

    // 多个取值步骤 → 按书写顺序的元组，副作用步骤不占位。
    let cell = OutcomeCell::<(u32, &'static str), Infallible>::new();
    let mut op = just_result_of![|| 1_u32, || (), || "two"]
        .connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(cell.take_exactly_one(), Outcome::Value((1, "two")));
}

#[test]
fn error_result_of_delivers_error_payload() {
    let cell = OutcomeCell::<Infallible, ProbeError>::new();
    let mut op = just_error_result_of![|| ProbeError::Definitely("lazy")]
        .connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
    start(&mut op);
    assert_eq!(
        cell.take_exactly_one(),
        Outcome::Error(ProbeError::Definitely("lazy"))
    );
}

#[test]
fn result_of_signature_is_value_only() {
    let sender = just_result_of![|| 1_u32];
    fn sigs_of<S: Sender>(_: &S) -> flint_core::signal::SignatureSet {
        S::completions::<EmptyEnv>()
    }
    let sigs = sigs_of(&sender);
    assert!(sigs.allows(SignalKind::Value));
    assert!(!sigs.allows(SignalKind::Error));
    assert!(!sigs.allows(SignalKind::Stopped));
}

#[test]
fn result_of_observer_sequence_uses_operation_name() {
    let observer = RecordingObserver::new();
    let env = TokenEnv::with_observer(NeverStopToken, observer.clone());
    let cell = OutcomeCell::<u32, Infallible>::new();
    let mut op = just_result_of![|| 2_u32].connect(RecordingReceiver::new(cell.clone(), env));
    start(&mut op);

    assert_eq!(
        observer.events(),
        [
            (ProtocolEvent::Start, "just_result_of"),
            (ProtocolEvent::SetValue, "just_result_of"),
        ]
    );
}
