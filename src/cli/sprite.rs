//! `sprite` command: print the artwork URL for a participant

use clap::Parser;

use crate::sprite::{sprite_url, FallbackSprite};
use crate::PokemonId;

/// Arguments for the `sprite` command
#[derive(Parser, Debug)]
pub struct SpriteArgs {
    /// Display name, e.g. "Mr. Mime"
    pub name: String,

    /// Numeric id used by the fallback URL
    pub id: PokemonId,

    /// Skip the remote lookup
    #[arg(long, default_value_t = false)]
    pub offline: bool,
}

impl SpriteArgs {
    /// Resolve the URL; never fails
    pub async fn execute(&self) -> String {
        if self.offline {
            FallbackSprite::url_for(self.id)
        } else {
            sprite_url(&self.name, self.id).await
        }
    }
}
