//! Brawl Stars domain: tags and the player lookup used for verification

pub mod client;
pub mod tag;

pub use client::{BrawlError, BrawlStarsClient, ClubRef, Player, PlayerDirectory};
pub use tag::{BrawlTag, TagError};
