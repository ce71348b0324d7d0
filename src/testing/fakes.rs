//! Deterministic stand-ins for the clock and the Brawl Stars API

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::brawl::{BrawlError, BrawlTag, ClubRef, Player, PlayerDirectory};
use crate::fsm::{Clock, ConversationContext};

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }
}

impl Default for FixedClock {
    /// Frozen at construction time, in UTC.
    fn default() -> Self {
        Self::new(Utc::now().with_timezone(&Utc.fix()))
    }
}

impl Clock for FixedClock {
    fn now(&self, _context: ConversationContext) -> DateTime<FixedOffset> {
        self.now
    }
}

/// In-memory player directory.
#[derive(Default)]
pub struct StaticDirectory {
    players: Mutex<HashMap<BrawlTag, Player>>,
    unavailable: AtomicBool,
    lookups: AtomicUsize,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, player: Player) {
        self.players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(player.tag.clone(), player);
    }

    /// Makes lookups fail as if the API were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlayerDirectory for StaticDirectory {
    async fn find_player(&self, tag: &BrawlTag) -> Result<Option<Player>, BrawlError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BrawlError::Status(StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(self
            .players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(tag)
            .cloned())
    }
}

/// Builds a player, optionally in a club. Panics on invalid tags, so only
/// use it with literals.
#[allow(clippy::expect_used)]
pub fn player(tag: &str, name: &str, club: Option<(&str, &str)>) -> Player {
    Player {
        tag: BrawlTag::parse(tag).expect("valid player tag literal"),
        name: name.to_string(),
        club: club.map(|(club_tag, club_name)| ClubRef {
            tag: BrawlTag::parse(club_tag).expect("valid club tag literal"),
            name: club_name.to_string(),
        }),
    }
}
