//! Asynchronous symbol dependency gathering.
//!
//! Before a symbol layer can build, two dependency branches must
//! resolve: glyph metrics/atlas rectangles for every referenced
//! codepoint, and the sprite atlas when an icon is requested. The
//! branches run concurrently and join structurally: the gather fails if
//! either branch fails and succeeds once both complete. Cancelling the
//! token aborts the join at any suspension point without touching any
//! bucket state.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::DependencyError;
use crate::symbol::shaping::{CodePoint, GlyphStack, SpriteAtlas};

/// A glyph fetch for one fontstack, scoped to a tile.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlyphRequest {
    pub tile_id: String,
    pub fontstack: String,
    pub codepoints: Vec<CodePoint>,
}

/// External glyph service.
#[async_trait]
pub trait GlyphProvider: Send + Sync {
    async fn get_glyphs(&self, request: GlyphRequest) -> Result<GlyphStack, DependencyError>;
}

/// External sprite service.
#[async_trait]
pub trait SpriteProvider: Send + Sync {
    async fn get_sprite_json(&self) -> Result<SpriteAtlas, DependencyError>;
}

/// Process-wide sprite memoization, passed explicitly to every build.
///
/// Each sprite name is written at most once — the first successful fetch
/// wins, all later lookups read the cached atlas — while reads from any
/// number of worker threads proceed concurrently.
#[derive(Clone, Default)]
pub struct SpriteCache {
    inner: Arc<RwLock<HashMap<String, Arc<SpriteAtlas>>>>,
}

impl SpriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<SpriteAtlas>> {
        self.inner
            .read()
            .ok()
            .and_then(|cache| cache.get(name).cloned())
    }

    pub async fn get_or_fetch(
        &self,
        name: &str,
        provider: &dyn SpriteProvider,
    ) -> Result<Arc<SpriteAtlas>, DependencyError> {
        if let Some(atlas) = self.get(name) {
            return Ok(atlas);
        }

        let fetched = Arc::new(provider.get_sprite_json().await?);

        let mut cache = self
            .inner
            .write()
            .map_err(|_| DependencyError::Sprite("sprite cache poisoned".to_string()))?;
        // A concurrent fetch may have won the race; keep the first write.
        Ok(cache.entry(name.to_string()).or_insert(fetched).clone())
    }
}

/// The resolved inputs a symbol bucket needs to start placing.
#[derive(Default)]
pub struct SymbolDependencies {
    pub stack: GlyphStack,
    pub sprite: Option<Arc<SpriteAtlas>>,
}

/// Resolve both dependency branches for one symbol layer build.
///
/// `glyph_request` is `None` for layers without text, `sprite_name` is
/// `None` for layers without an icon; a missing branch resolves
/// immediately.
pub async fn gather_dependencies(
    glyph_request: Option<GlyphRequest>,
    sprite_name: Option<&str>,
    glyphs: &dyn GlyphProvider,
    sprites: &dyn SpriteProvider,
    cache: &SpriteCache,
    cancel: &CancellationToken,
) -> Result<SymbolDependencies, DependencyError> {
    let glyph_branch = async {
        match glyph_request {
            Some(request) => glyphs.get_glyphs(request).await.map(Some),
            None => Ok(None),
        }
    };
    let sprite_branch = async {
        match sprite_name {
            Some(name) => cache.get_or_fetch(name, sprites).await.map(Some),
            None => Ok(None),
        }
    };

    tokio::select! {
        // Cancellation wins over an already-completed join.
        biased;
        _ = cancel.cancelled() => Err(DependencyError::Aborted),
        joined = async { tokio::try_join!(glyph_branch, sprite_branch) } => {
            let (stack, sprite) = joined?;
            Ok(SymbolDependencies {
                stack: stack.unwrap_or_default(),
                sprite,
            })
        }
    }
}
