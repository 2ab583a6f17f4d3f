use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Category a genre classifies files into.
///
/// The category decides which concrete variant a submission file
/// materializes as; see [`crate::model::FileVariant`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreCategory {
    Document,
    Artwork,
}

impl GenreCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Artwork => "artwork",
        }
    }
}

impl fmt::Display for GenreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenreCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "artwork" => Ok(Self::Artwork),
            other => Err(format!("unknown genre category: {other}")),
        }
    }
}

/// A file classification registered for one press context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Genre {
    pub genre_id: i32,
    pub context_id: i32,
    pub name: String,
    /// Short label embedded in canonical file names (e.g. "MS", "ART").
    pub designation: String,
    pub category: GenreCategory,
}

/// Classification source resolving a genre id within a press context.
///
/// The registry is an external collaborator; the bundled
/// [`StaticGenreRegistry`] covers tests and embedding callers that manage
/// genres themselves.
#[async_trait]
pub trait GenreResolver: Send + Sync {
    /// Look up a genre. `None` when the id is not registered for the context.
    async fn genre(&self, context_id: i32, genre_id: i32) -> Option<Genre>;
}

/// In-memory genre registry.
#[derive(Debug, Default)]
pub struct StaticGenreRegistry {
    genres: HashMap<(i32, i32), Genre>,
}

impl StaticGenreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a genre, replacing any previous entry with the same id.
    pub fn register(&mut self, genre: Genre) {
        self.genres
            .insert((genre.context_id, genre.genre_id), genre);
    }
}

#[async_trait]
impl GenreResolver for StaticGenreRegistry {
    async fn genre(&self, context_id: i32, genre_id: i32) -> Option<Genre> {
        self.genres.get(&(context_id, genre_id)).cloned()
    }
}
