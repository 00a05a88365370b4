use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SharedError;

/// How a game is delivered to players
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameType {
    HostedLink,
    UploadedBuild,
}

/// Catalog lifecycle status of a game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Active,
    Deprecated,
    Inactive,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Active => "ACTIVE",
            GameStatus::Deprecated => "DEPRECATED",
            GameStatus::Inactive => "INACTIVE",
        }
    }

    /// The backend stores visibility as a flag; only ACTIVE maps to visible.
    pub fn is_active(&self) -> bool {
        matches!(self, GameStatus::Active)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(GameStatus::Active),
            "DEPRECATED" => Ok(GameStatus::Deprecated),
            "INACTIVE" => Ok(GameStatus::Inactive),
            _ => Err(SharedError::Validation(format!("Unknown game status: {}", s))),
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameType::HostedLink => "HOSTED_LINK",
            GameType::UploadedBuild => "UPLOADED_BUILD",
        })
    }
}

impl FromStr for GameType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "HOSTED_LINK" => Ok(GameType::HostedLink),
            "UPLOADED_BUILD" => Ok(GameType::UploadedBuild),
            _ => Err(SharedError::Validation(format!("Unknown game type: {}", s))),
        }
    }
}

/// A game in the platform catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Game's ID (string UUID)
    pub game_id: String,

    /// Display title
    #[serde(default)]
    pub title: Option<String>,

    /// Game's description
    #[serde(default)]
    pub description: Option<String>,

    pub game_type: GameType,

    /// Hosted link or build location
    pub url: String,

    pub status: GameStatus,

    pub created_at: DateTime<FixedOffset>,
}

impl Game {
    /// Title to show in lists; the id stands in for untitled games
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.trim().is_empty()).unwrap_or(&self.game_id)
    }
}

/// A tenant (client) of the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

/// Tenant reference embedded in a client game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenantRef {
    pub id: String,
    pub name: String,
}

/// Per-tenant configuration of a catalog game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientGame {
    /// Backend row id. Ids are strings everywhere, numeric ids are accepted.
    #[serde(deserialize_with = "crate::dto::metrics::string_or_number")]
    pub id: String,
    pub game_id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub game: Option<Game>,
    #[serde(default)]
    pub tenant: Option<TenantRef>,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl ClientGame {
    /// Tenant override title, falling back to the catalog title
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.game.as_ref().map(|g| g.display_title()))
            .unwrap_or(&self.game_id)
    }
}
