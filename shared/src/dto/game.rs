use crate::models::game::{GameStatus, GameType};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /client-games`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Display title
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title is required and must be at most 200 characters"
    ))]
    pub title: String,

    /// Optional long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_description_len"))]
    pub description: Option<String>,

    pub game_type: GameType,

    /// Launch URL, must be http(s)
    #[validate(custom(function = "validate_http_url"))]
    pub url: String,

    pub status: GameStatus,
}

impl CreateGameRequest {
    pub fn new(title: impl Into<String>, url: impl Into<String>, game_type: GameType) -> Self {
        Self {
            title: title.into().trim().to_string(),
            description: None,
            game_type,
            url: url.into().trim().to_string(),
            status: GameStatus::Active,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    pub fn with_status(mut self, status: GameStatus) -> Self {
        self.status = status;
        self
    }
}

/// Partial game edit sent to `PUT /client-games/{id}`. Unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_description_len"))]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<GameType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_http_url"))]
    pub url: Option<String>,
}

impl UpdateGameRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.game_type.is_none() && self.url.is_none()
    }
}

/// Status change for a catalog game. The backend only understands `{isActive}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameStatusUpdate {
    pub is_active: bool,
}

impl From<GameStatus> for GameStatusUpdate {
    fn from(status: GameStatus) -> Self {
        Self {
            is_active: status.is_active(),
        }
    }
}

/// Show/hide a game for one tenant: `PUT /client-games/{tenant}/{game}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientGameStatusUpdate {
    pub tenant_id: String,
    pub is_active: bool,
}

/// Tenant-specific title and description override
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientGameInfoUpdate {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title is required and must be at most 200 characters"
    ))]
    pub title: String,

    #[validate(length(max = 4000, message = "Description must be at most 4000 characters"))]
    pub description: String,
}

fn validate_description_len(text: &String) -> Result<(), validator::ValidationError> {
    if text.len() > 4000 {
        let mut err = validator::ValidationError::new("length");
        err.message = Some("Description must be at most 4000 characters".into());
        return Err(err);
    }
    Ok(())
}

fn validate_http_url(url: &String) -> Result<(), validator::ValidationError> {
    let has_scheme = url.starts_with("http://") || url.starts_with("https://");
    let has_host = url.splitn(2, "://").nth(1).map(|rest| !rest.is_empty()).unwrap_or(false);
    if !has_scheme || !has_host {
        let mut err = validator::ValidationError::new("url");
        err.message = Some("Please enter a valid http(s) URL".into());
        return Err(err);
    }
    Ok(())
}
