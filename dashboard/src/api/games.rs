//! Game catalog and per-tenant game configuration endpoints
//! (`/client-games`). Mutations invalidate the same tags the lists and
//! detail reads are cached under.

use log::{debug, info};
use reqwest::Method;
use shared::{
    ClientGame, ClientGameInfoUpdate, ClientGameStatusUpdate, CreateGameRequest, Game, GameStatus,
    GameStatusUpdate, SuccessResponse, UpdateGameRequest,
};
use validator::Validate;

use crate::api::cache::CacheTag;
use crate::api::client::{segment, ApiClient};
use crate::error::{ApiError, Result};

const GAMES_PATH: &str = "client-games";

fn game_path(game_id: &str) -> String {
    format!("{}/{}", GAMES_PATH, segment(game_id))
}

fn client_game_path(tenant_id: &str, game_id: &str) -> String {
    format!("{}/{}/{}", GAMES_PATH, segment(tenant_id), segment(game_id))
}

fn require_id(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", what)));
    }
    Ok(())
}

fn client_game_tags(tenant_id: &str, game_id: &str) -> [CacheTag; 3] {
    [
        CacheTag::ClientGameConfig {
            tenant_id: tenant_id.to_string(),
            game_id: game_id.to_string(),
        },
        CacheTag::ClientGameList,
        CacheTag::GameList,
    ]
}

impl ApiClient {
    pub async fn list_games(&self) -> Result<Vec<Game>> {
        let games: Vec<Game> = self.get_json(GAMES_PATH, vec![], vec![CacheTag::GameList]).await?;
        debug!("Found {} games", games.len());
        Ok(games)
    }

    pub async fn list_games_by_status(&self, status: GameStatus) -> Result<Vec<Game>> {
        self.get_json(
            GAMES_PATH,
            vec![("status".to_string(), status.as_str().to_string())],
            vec![CacheTag::GameList],
        )
        .await
    }

    pub async fn get_game(&self, game_id: &str) -> Result<Game> {
        require_id(game_id, "Game id")?;
        self.get_json(&game_path(game_id), vec![], vec![CacheTag::Game(game_id.to_string())])
            .await
    }

    pub async fn create_game(&self, request: &CreateGameRequest) -> Result<Game> {
        request.validate()?;
        let body = serde_json::to_value(request)?;
        let game: Game = self
            .send_json(Method::POST, GAMES_PATH, Some(body), &[CacheTag::GameList])
            .await?;
        info!("Created game {} ({})", game.display_title(), game.game_id);
        Ok(game)
    }

    pub async fn update_game(&self, game_id: &str, request: &UpdateGameRequest) -> Result<Game> {
        require_id(game_id, "Game id")?;
        if request.is_empty() {
            return Err(ApiError::Validation("Nothing to update".to_string()));
        }
        request.validate()?;
        let body = serde_json::to_value(request)?;
        self.send_json(
            Method::PUT,
            &game_path(game_id),
            Some(body),
            &[CacheTag::Game(game_id.to_string()), CacheTag::GameList],
        )
        .await
    }

    /// Status changes travel as `{isActive}`
    pub async fn set_game_status(&self, game_id: &str, status: GameStatus) -> Result<Game> {
        require_id(game_id, "Game id")?;
        let body = serde_json::to_value(GameStatusUpdate::from(status))?;
        let game: Game = self
            .send_json(
                Method::PUT,
                &game_path(game_id),
                Some(body),
                &[CacheTag::Game(game_id.to_string()), CacheTag::GameList],
            )
            .await?;
        info!("Game {} is now {}", game_id, game.status);
        Ok(game)
    }

    pub async fn delete_game(&self, game_id: &str) -> Result<SuccessResponse> {
        require_id(game_id, "Game id")?;
        let ack: SuccessResponse = self
            .send_json(
                Method::DELETE,
                &game_path(game_id),
                None,
                &[CacheTag::Game(game_id.to_string()), CacheTag::GameList],
            )
            .await?;
        info!("Deleted game {}", game_id);
        Ok(ack)
    }

    /// Games configured for one tenant
    pub async fn list_client_games(&self, tenant_id: &str) -> Result<Vec<ClientGame>> {
        require_id(tenant_id, "Tenant id")?;
        let games: Vec<ClientGame> = self
            .get_json(
                GAMES_PATH,
                vec![("tenantId".to_string(), tenant_id.to_string())],
                vec![CacheTag::ClientGameList],
            )
            .await?;
        debug!("Found {} games for tenant {}", games.len(), tenant_id);
        Ok(games)
    }

    /// Shows or hides a game for a tenant
    pub async fn set_client_game_active(&self, tenant_id: &str, game_id: &str, is_active: bool) -> Result<ClientGame> {
        require_id(tenant_id, "Tenant id")?;
        require_id(game_id, "Game id")?;
        let body = serde_json::to_value(ClientGameStatusUpdate {
            tenant_id: tenant_id.to_string(),
            is_active,
        })?;
        self.send_json(
            Method::PUT,
            &client_game_path(tenant_id, game_id),
            Some(body),
            &client_game_tags(tenant_id, game_id),
        )
        .await
    }

    pub async fn update_client_game_info(
        &self,
        tenant_id: &str,
        game_id: &str,
        update: &ClientGameInfoUpdate,
    ) -> Result<ClientGame> {
        require_id(tenant_id, "Tenant id")?;
        require_id(game_id, "Game id")?;
        update.validate()?;
        let body = serde_json::to_value(update)?;
        self.send_json(
            Method::PUT,
            &client_game_path(tenant_id, game_id),
            Some(body),
            &client_game_tags(tenant_id, game_id),
        )
        .await
    }

    /// Pushes the tenant's game configuration live
    pub async fn publish_client_games(&self, tenant_id: &str) -> Result<SuccessResponse> {
        require_id(tenant_id, "Tenant id")?;
        let path = format!("{}/{}/publish", GAMES_PATH, segment(tenant_id));
        let ack: SuccessResponse = self
            .send_json(Method::POST, &path, Some(serde_json::json!({})), &[CacheTag::ClientGameList])
            .await?;
        info!("Published client games for tenant {}", tenant_id);
        Ok(ack)
    }
}
