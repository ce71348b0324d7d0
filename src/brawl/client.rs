//! Brawl Stars API client
//!
//! Only the player lookup needed for verification is implemented. Responses
//! (including "not found") are cached for [`config::brawl::cache_ttl`].

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::tag::BrawlTag;
use crate::core::config;

/// A player as far as club membership is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub tag: BrawlTag,
    pub name: String,
    pub club: Option<ClubRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClubRef {
    pub tag: BrawlTag,
    pub name: String,
}

impl Player {
    /// True if the player currently belongs to the given club.
    pub fn is_in_club(&self, club_tag: &BrawlTag) -> bool {
        self.club.as_ref().is_some_and(|club| &club.tag == club_tag)
    }
}

#[derive(Debug, Error)]
pub enum BrawlError {
    #[error("Brawl Stars API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Brawl Stars API returned status {0}")]
    Status(StatusCode),
    #[error("Brawl Stars API returned an invalid tag: {0}")]
    InvalidTag(#[from] super::tag::TagError),
}

/// Looks players up by tag.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Returns `Ok(None)` if no player has this tag.
    async fn find_player(&self, tag: &BrawlTag) -> Result<Option<Player>, BrawlError>;
}

#[derive(Debug, Deserialize)]
struct PlayerDto {
    tag: String,
    name: String,
    #[serde(default)]
    club: Option<ClubDto>,
}

/// Players outside a club come back with `"club": {}`.
#[derive(Debug, Deserialize)]
struct ClubDto {
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl TryFrom<PlayerDto> for Player {
    type Error = BrawlError;

    fn try_from(dto: PlayerDto) -> Result<Self, Self::Error> {
        let club = match dto.club {
            Some(ClubDto { tag: Some(tag), name }) => Some(ClubRef {
                tag: BrawlTag::parse(&tag)?,
                name: name.unwrap_or_default(),
            }),
            _ => None,
        };
        Ok(Self {
            tag: BrawlTag::parse(&dto.tag)?,
            name: dto.name,
            club,
        })
    }
}

/// HTTP implementation of [`PlayerDirectory`] with a TTL cache.
pub struct BrawlStarsClient {
    http: Client,
    base_url: String,
    token: String,
    cache: Cache<BrawlTag, Option<Player>>,
}

impl BrawlStarsClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, BrawlError> {
        let http = Client::builder().timeout(config::brawl::timeout()).build()?;
        let cache = Cache::builder()
            .max_capacity(config::brawl::CACHE_CAPACITY)
            .time_to_live(config::brawl::cache_ttl())
            .build();

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            cache,
        })
    }

    /// Client configured from `BRAWL_API_URL` / `BRAWL_API_TOKEN`.
    pub fn from_env() -> Result<Self, BrawlError> {
        if config::brawl::API_TOKEN.is_empty() {
            log::warn!("BRAWL_API_TOKEN is not set; player lookups will be rejected by the API");
        }
        Self::new(config::brawl::API_URL.as_str(), config::brawl::API_TOKEN.as_str())
    }

    fn player_url(&self, tag: &BrawlTag) -> String {
        format!("{}/players/{}", self.base_url, tag.url_encoded())
    }

    async fn fetch_player(&self, tag: &BrawlTag) -> Result<Option<Player>, BrawlError> {
        let response = self.http.get(self.player_url(tag)).bearer_auth(&self.token).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let dto: PlayerDto = response.json().await?;
                Ok(Some(Player::try_from(dto)?))
            }
            status => Err(BrawlError::Status(status)),
        }
    }
}

#[async_trait]
impl PlayerDirectory for BrawlStarsClient {
    async fn find_player(&self, tag: &BrawlTag) -> Result<Option<Player>, BrawlError> {
        if let Some(cached) = self.cache.get(tag).await {
            return Ok(cached);
        }

        let player = self.fetch_player(tag).await?;
        log::debug!("Fetched player {} (found: {})", tag, player.is_some());
        self.cache.insert(tag.clone(), player.clone()).await;
        Ok(player)
    }
}
