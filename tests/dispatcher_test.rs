//! Dispatcher behaviour: /start, entry chains, persistence and errors
//!
//! Run with: cargo test --test dispatcher_test

mod common;

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;

use clubwarden::fsm::{DispatchOutcome, EngineError, Inbound, ReturnTo, State, StateKind, StateStore, StoreError};
use clubwarden::testing::TestBench;
use common::{chat, sample_state, scripted_registry, Probe, Scripted, Step};

#[tokio::test]
async fn new_chat_start_commits_initial_and_sends_welcome() {
    let bench = TestBench::new().unwrap();
    let ctx = chat(1);
    assert!(!bench.store.contains(ctx));

    let outcome = bench.send(ctx, "/start").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Waiting(StateKind::Initial));
    assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx));
    assert_eq!(bench.messenger.texts(ctx), vec![bench.t(ctx, "welcome.text")]);
    assert!(bench.user(ctx).unwrap().is_some());
}

#[tokio::test]
async fn start_resets_every_state_kind() {
    let bench = TestBench::new().unwrap();

    for (offset, kind) in StateKind::iter().enumerate() {
        let ctx = chat(1000 + offset as i64);
        bench.store.commit(ctx, Some(&sample_state(kind, ctx))).await.unwrap();

        let outcome = bench.send(ctx, "/start").await.unwrap();

        assert_eq!(outcome, DispatchOutcome::Waiting(StateKind::Initial), "from {kind}");
        assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx), "from {kind}");
    }
}

#[tokio::test]
async fn start_with_bot_suffix_and_payload_still_resets() {
    let bench = TestBench::new().unwrap();
    let ctx = chat(2);
    bench
        .store
        .commit(ctx, Some(&State::AwaitingPlayerTag { context: ctx }))
        .await
        .unwrap();

    bench.send(ctx, "/start@ClubWardenBot ref").await.unwrap();

    assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx));
}

#[tokio::test]
async fn back_from_language_picker_runs_target_entry() {
    let bench = TestBench::new().unwrap();
    let ctx = chat(3);
    bench.send(ctx, "/start").await.unwrap();
    bench
        .store
        .commit(
            ctx,
            Some(&State::LanguagePicker {
                context: ctx,
                return_to: ReturnTo::GuestMainMenu,
            }),
        )
        .await
        .unwrap();
    bench.messenger.take();

    let back = bench.t(ctx, "button.back");
    let outcome = bench.send(ctx, &back).await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Waiting(StateKind::GuestMainMenu));
    assert_eq!(bench.state(ctx).await.unwrap(), State::GuestMainMenu { context: ctx });
    assert_eq!(bench.messenger.texts(ctx), vec![bench.t(ctx, "menu.guest")]);
}

#[tokio::test]
async fn unknown_text_in_language_picker_keeps_state() {
    let bench = TestBench::new().unwrap();
    let ctx = chat(4);
    bench.send(ctx, "/start").await.unwrap();
    let picker = State::LanguagePicker {
        context: ctx,
        return_to: ReturnTo::Initial,
    };
    bench.store.commit(ctx, Some(&picker)).await.unwrap();
    bench.messenger.take();

    let outcome = bench.send(ctx, "Klingon").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Unchanged(StateKind::LanguagePicker));
    assert_eq!(bench.state(ctx).await.unwrap(), picker);
    assert_eq!(bench.messenger.texts(ctx), vec![bench.t(ctx, "common.invalid-choice")]);
    // The picker's keyboard comes with the reply
    assert!(bench.messenger.last(ctx).unwrap().buttons().contains(&"Deutsch"));
}

#[tokio::test]
async fn entry_returning_itself_runs_once() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![Scripted::new(StateKind::Initial, Step::Stay, Step::Stay, &probe)]);
    let bench = TestBench::builder().registry(registry).build().unwrap();
    let ctx = chat(5);

    bench.send(ctx, "/start").await.unwrap();

    assert_eq!(probe.entries(), vec![(StateKind::Initial, None)]);
    assert_eq!(bench.messenger.len(), 1);
    assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx));
}

#[tokio::test]
async fn entry_chain_follows_to_fixed_point() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![
        Scripted::new(StateKind::Initial, Step::Go(StateKind::GuestMainMenu), Step::Stay, &probe),
        Scripted::new(StateKind::GuestMainMenu, Step::Go(StateKind::MemberMainMenu), Step::Stay, &probe),
        Scripted::new(StateKind::MemberMainMenu, Step::Stay, Step::Stay, &probe),
    ]);
    let bench = TestBench::builder().registry(registry).build().unwrap();
    let ctx = chat(6);

    let outcome = bench.send(ctx, "/start").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Waiting(StateKind::MemberMainMenu));
    assert_eq!(
        probe.entries(),
        vec![
            (StateKind::Initial, None),
            (StateKind::GuestMainMenu, Some(StateKind::Initial)),
            (StateKind::MemberMainMenu, Some(StateKind::GuestMainMenu)),
        ]
    );
    assert_eq!(bench.state(ctx).await.unwrap(), State::MemberMainMenu { context: ctx });
}

#[tokio::test]
async fn process_transition_passes_current_as_previous() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![
        Scripted::new(StateKind::Initial, Step::Stay, Step::Go(StateKind::GuestMainMenu), &probe),
        Scripted::new(StateKind::GuestMainMenu, Step::Stay, Step::Stay, &probe),
    ]);
    let bench = TestBench::builder().registry(registry).build().unwrap();
    let ctx = chat(7);

    bench.send(ctx, "/start").await.unwrap();
    let outcome = bench.send(ctx, "anything").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Waiting(StateKind::GuestMainMenu));
    assert_eq!(probe.processed(), vec![StateKind::Initial]);
    assert_eq!(
        probe.entries().last(),
        Some(&(StateKind::GuestMainMenu, Some(StateKind::Initial)))
    );
}

#[tokio::test]
async fn terminal_result_deletes_record() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![Scripted::new(StateKind::Initial, Step::Stay, Step::End, &probe)]);
    let bench = TestBench::builder().registry(registry).build().unwrap();
    let ctx = chat(8);

    bench.send(ctx, "/start").await.unwrap();
    assert!(bench.store.contains(ctx));

    let outcome = bench.send(ctx, "bye").await.unwrap();

    assert_eq!(outcome, DispatchOutcome::Terminated);
    assert!(!bench.store.contains(ctx));
    // The next message starts over
    assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx));
}

#[tokio::test]
async fn runaway_chain_is_fatal_and_commits_nothing() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![
        Scripted::new(StateKind::Initial, Step::Go(StateKind::GuestMainMenu), Step::Stay, &probe),
        Scripted::new(StateKind::GuestMainMenu, Step::Go(StateKind::Initial), Step::Stay, &probe),
    ]);
    let bench = TestBench::builder().registry(registry).max_chain(8).build().unwrap();
    let ctx = chat(9);

    let err = bench.send(ctx, "/start").await.unwrap_err();

    assert!(matches!(err, EngineError::ChainTooLong { limit: 8, .. }), "{err:?}");
    assert!(err.is_fatal());
    assert_eq!(probe.entries().len(), 8);
    assert!(!bench.store.contains(ctx));
}

#[tokio::test]
async fn unregistered_kind_is_fatal() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![Scripted::new(
        StateKind::Initial,
        Step::Go(StateKind::AdminViewSettings),
        Step::Stay,
        &probe,
    )]);
    let bench = TestBench::builder().registry(registry).build().unwrap();

    let err = bench.send(chat(10), "/start").await.unwrap_err();

    assert!(matches!(err, EngineError::Unregistered(StateKind::AdminViewSettings)), "{err:?}");
    assert!(err.is_fatal());
}

#[tokio::test]
async fn foreign_state_is_rejected() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![
        Scripted::new(StateKind::Initial, Step::GoForeign(StateKind::Initial), Step::Stay, &probe),
    ]);
    let bench = TestBench::builder().registry(registry).build().unwrap();
    let ctx = chat(11);

    let err = bench.send(ctx, "/start").await.unwrap_err();

    assert!(matches!(err, EngineError::ForeignContext { .. }), "{err:?}");
    assert!(bench.store.is_empty());
}

#[tokio::test]
async fn corrupt_record_is_an_error_until_start() {
    let bench = TestBench::new().unwrap();
    let ctx = chat(12);
    bench.store.insert_raw(ctx, r#"{"variant":"NoSuchState","context":12}"#);

    let err = bench.send(ctx, "hello").await.unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Corrupt { .. })), "{err:?}");
    assert!(!err.is_fatal());
    assert!(bench.messenger.is_empty());

    bench.send(ctx, "/start").await.unwrap();
    assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx));
}

#[tokio::test]
async fn restart_twice_keeps_one_record() {
    let bench = TestBench::new().unwrap();
    let ctx = chat(13);

    bench.dispatcher.restart(ctx).await.unwrap();
    bench.dispatcher.restart(ctx).await.unwrap();

    assert_eq!(bench.store.len(), 1);
    assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx));
}

#[tokio::test]
async fn failed_send_leaves_previous_state_committed() {
    let bench = TestBench::new().unwrap();
    let ctx = chat(14);
    bench.send(ctx, "/start").await.unwrap();
    bench.messenger.take();

    bench.messenger.fail_next(1);
    let verify = bench.t(ctx, "button.verify");
    let err = bench.send(ctx, &verify).await.unwrap_err();

    assert!(matches!(err, EngineError::Send(_)), "{err:?}");
    assert!(!err.is_fatal());
    assert_eq!(bench.state(ctx).await.unwrap(), State::initial(ctx));

    // Retrying the same button reaches the prompt this time
    bench.send(ctx, &verify).await.unwrap();
    assert_eq!(bench.state(ctx).await.unwrap(), State::AwaitingPlayerTag { context: ctx });
}

#[tokio::test]
async fn same_chat_updates_never_overlap() {
    let probe = Arc::new(Probe::default());
    let registry = scripted_registry(vec![Scripted::new(StateKind::Initial, Step::Stay, Step::Stay, &probe)
        .with_process_delay(Duration::from_millis(2))]);
    let bench = Arc::new(TestBench::builder().registry(registry).build().unwrap());
    let ctx = chat(15);
    bench.send(ctx, "/start").await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let bench = Arc::clone(&bench);
            tokio::spawn(async move {
                bench
                    .dispatcher
                    .dispatch(&Inbound::text(ctx, &format!("message {i}")))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(probe.processed().len(), 16);
    assert_eq!(probe.max_active(), 1);
    assert_eq!(bench.dispatcher.active_conversations(), 0);
}

#[tokio::test]
async fn finished_chats_do_not_keep_locks() {
    let bench = TestBench::new().unwrap();

    for id in 0..50 {
        bench.send(chat(1000 + id), "/start").await.unwrap();
    }
    bench.dispatcher.restart(chat(1000)).await.unwrap();
    // A failed dispatch releases its lock too
    bench.store.insert_raw(chat(2000), "not json");
    assert!(bench.send(chat(2000), "hello").await.is_err());

    assert_eq!(bench.dispatcher.active_conversations(), 0);
    assert_eq!(bench.store.len(), 51);
}
