//! Best-effort sprite URL lookup for presentation layers
//!
//! The remote lookup asks PokeAPI for the official artwork of a name; the
//! fallback builds the artwork URL straight from the numeric id. Neither
//! reports errors: a lookup that fails just yields `None`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::fetcher::{FetcherError, FetcherResult};
use crate::PokemonId;

/// PokeAPI species endpoint
pub const POKEAPI_URL: &str = "https://pokeapi.co/api/v2/pokemon";

/// Official artwork location keyed by id
pub const ARTWORK_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// Remote lookups are cut off after this long
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

/// Something that may know a sprite URL
#[async_trait]
pub trait SpriteSource: Send + Sync {
    /// Sprite URL for the given participant, if known
    async fn lookup(&self, name: &str, id: PokemonId) -> Option<String>;
}

/// Normalize a display name into a PokeAPI slug
pub fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace(['.', '\''], "")
        .replace('♀', "-f")
        .replace('♂', "-m")
}

/// Queries PokeAPI by name
pub struct RemoteSpriteLookup {
    client: Client,
    base_url: String,
}

impl RemoteSpriteLookup {
    /// Lookup against PokeAPI with a one second timeout
    pub fn new() -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| FetcherError::ClientSetup(e.to_string()))?;
        Ok(Self::with_client(client, POKEAPI_URL))
    }

    /// Lookup against another PokeAPI-compatible endpoint
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpriteSource for RemoteSpriteLookup {
    async fn lookup(&self, name: &str, _id: PokemonId) -> Option<String> {
        let slug = slug(name);
        if slug.is_empty() {
            return None;
        }

        let url = format!("{}/{}", self.base_url, slug);
        let response = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("Sprite lookup for {} returned {}", slug, r.status());
                return None;
            }
            Err(e) => {
                debug!("Sprite lookup for {} failed: {}", slug, e);
                return None;
            }
        };

        let body: Value = response.json().await.ok()?;
        body.pointer("/sprites/other/official-artwork/front_default")?
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Deterministic artwork URL from the id
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSprite;

impl FallbackSprite {
    /// Artwork URL for `id`
    pub fn url_for(id: PokemonId) -> String {
        format!("{ARTWORK_URL}/{id}.png")
    }
}

#[async_trait]
impl SpriteSource for FallbackSprite {
    async fn lookup(&self, _name: &str, id: PokemonId) -> Option<String> {
        Some(Self::url_for(id))
    }
}

/// Try `primary`, then `fallback`
pub struct FirstAvailable<A, B> {
    primary: A,
    fallback: B,
}

impl<A, B> FirstAvailable<A, B> {
    /// Compose two sources
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<A, B> SpriteSource for FirstAvailable<A, B>
where
    A: SpriteSource,
    B: SpriteSource,
{
    async fn lookup(&self, name: &str, id: PokemonId) -> Option<String> {
        match self.primary.lookup(name, id).await {
            Some(url) => Some(url),
            None => self.fallback.lookup(name, id).await,
        }
    }
}

/// Resolve a sprite URL, always producing one
///
/// Tries PokeAPI first and falls back to the id-keyed artwork URL.
pub async fn sprite_url(name: &str, id: PokemonId) -> String {
    let found = match RemoteSpriteLookup::new() {
        Ok(remote) => FirstAvailable::new(remote, FallbackSprite).lookup(name, id).await,
        Err(e) => {
            debug!("Sprite lookup unavailable: {}", e);
            None
        }
    };
    found.unwrap_or_else(|| FallbackSprite::url_for(id))
}
