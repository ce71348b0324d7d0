//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clubwarden::brawl::BrawlTag;
use clubwarden::fsm::{
    ConversationContext, Deps, EngineError, HookResult, Inbound, OutboundMessage, Registry, ReturnTo, State,
    StateHandler, StateKind,
};
use clubwarden::storage::settings::SettingKey;
use clubwarden::testing::{player, TestBench};

pub const CLUB_TAG: &str = "#8QJ";
pub const MEMBER_TAG: &str = "#2PP";
pub const OUTSIDER_TAG: &str = "#9LQ";
pub const ADMIN: i64 = 100;

pub fn chat(id: i64) -> ConversationContext {
    ConversationContext::new(id)
}

/// Bench with a configured club, one player inside it and one outside.
pub fn club_bench(admins: &[i64]) -> TestBench {
    let bench = TestBench::builder().admins(admins.iter().copied()).build().unwrap();
    bench.set_setting(SettingKey::ClubTag, CLUB_TAG).unwrap();
    bench
        .players
        .insert(player(MEMBER_TAG, "Shelly", Some((CLUB_TAG, "Wardens"))));
    bench.players.insert(player(OUTSIDER_TAG, "Colt", None));
    bench
}

/// A state of `kind` belonging to `context`, with arbitrary payload.
pub fn sample_state(kind: StateKind, context: ConversationContext) -> State {
    let tag = BrawlTag::parse(MEMBER_TAG).unwrap();
    match kind {
        StateKind::Initial => State::Initial { context },
        StateKind::AwaitingPlayerTag => State::AwaitingPlayerTag { context },
        StateKind::AwaitingClubRuleAcceptance => State::AwaitingClubRuleAcceptance { context, tag },
        StateKind::AwaitingChatRuleAcceptance => State::AwaitingChatRuleAcceptance { context, tag },
        StateKind::GuestMainMenu => State::GuestMainMenu { context },
        StateKind::MemberMainMenu => State::MemberMainMenu { context },
        StateKind::AdminViewSettings => State::AdminViewSettings { context },
        StateKind::AdminEditSetting => State::AdminEditSetting {
            context,
            key: SettingKey::ChatInviteLink,
        },
        StateKind::LanguagePicker => State::LanguagePicker {
            context,
            return_to: ReturnTo::MemberMainMenu,
        },
    }
}

/// What a [`Scripted`] hook does once called.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Stay,
    Go(StateKind),
    /// Move to a state of another chat
    GoForeign(StateKind),
    End,
    /// Fail the first call only
    FailOnce,
    Fail,
    Panic,
}

/// Observations shared by every [`Scripted`] handler of a registry.
#[derive(Default)]
pub struct Probe {
    entries: Mutex<Vec<(StateKind, Option<StateKind>)>>,
    processed: Mutex<Vec<StateKind>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    failed: AtomicBool,
}

impl Probe {
    /// `(entered, previous)` for every entry call, in order.
    pub fn entries(&self) -> Vec<(StateKind, Option<StateKind>)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn processed(&self) -> Vec<StateKind> {
        self.processed.lock().unwrap().clone()
    }

    /// Highest number of `process` calls seen running at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// Handler driven by a fixed script, sending "entered <kind>" on every entry.
pub struct Scripted {
    kind: StateKind,
    on_entry: Step,
    on_process: Step,
    process_delay: Option<Duration>,
    probe: Arc<Probe>,
}

impl Scripted {
    pub fn new(kind: StateKind, on_entry: Step, on_process: Step, probe: &Arc<Probe>) -> Self {
        Self {
            kind,
            on_entry,
            on_process,
            process_delay: None,
            probe: Arc::clone(probe),
        }
    }

    pub fn with_process_delay(mut self, delay: Duration) -> Self {
        self.process_delay = Some(delay);
        self
    }

    fn run(&self, step: Step, state: &State) -> HookResult {
        let context = state.context();
        match step {
            Step::Stay => Ok(Some(state.clone())),
            Step::Go(kind) => Ok(Some(sample_state(kind, context))),
            Step::GoForeign(kind) => Ok(Some(sample_state(kind, chat(context.chat_id() + 1)))),
            Step::End => Ok(None),
            Step::FailOnce if !self.probe.failed.swap(true, Ordering::SeqCst) => {
                Err(EngineError::Hook(anyhow::anyhow!("{} failed once", self.kind)))
            }
            Step::FailOnce => Ok(Some(state.clone())),
            Step::Fail => Err(EngineError::Hook(anyhow::anyhow!("{} always fails", self.kind))),
            Step::Panic => panic!("{} panicked", self.kind),
        }
    }
}

#[async_trait]
impl StateHandler for Scripted {
    fn kind(&self) -> StateKind {
        self.kind
    }

    async fn entry(&self, state: &State, previous: Option<&State>, deps: &Deps) -> HookResult {
        self.probe
            .entries
            .lock()
            .unwrap()
            .push((state.kind(), previous.map(State::kind)));
        deps.send(state.context(), OutboundMessage::text(format!("entered {}", self.kind)))
            .await?;
        self.run(self.on_entry, state)
    }

    async fn process(&self, state: &State, _input: &Inbound, _deps: &Deps) -> HookResult {
        self.probe.processed.lock().unwrap().push(state.kind());

        let active = self.probe.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_active.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.process_delay {
            tokio::time::sleep(delay).await;
        }
        self.probe.active.fetch_sub(1, Ordering::SeqCst);

        self.run(self.on_process, state)
    }
}

/// Registry of scripted handlers for the given kinds only.
pub fn scripted_registry(handlers: Vec<Scripted>) -> Registry {
    handlers
        .into_iter()
        .fold(Registry::builder(), |builder, handler| builder.register(handler))
        .build_partial()
        .unwrap()
}

/// Waits until `check` holds, failing the test after two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
