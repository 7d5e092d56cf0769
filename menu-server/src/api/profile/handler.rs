//! Profile API Handlers

use axum::{Json, extract::State};
use shared::message::SyncAction;
use shared::models::{Profile, ProfileUpdate};

use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, MAX_URL_LEN, validate_optional_text};

const RESOURCE: &str = "profile";

/// GET /api/profile - 菜单外观设置
pub async fn get(State(state): State<ServerState>) -> AppResult<Json<Profile>> {
    let profile = state.store.get_profile().await?;
    Ok(Json(profile))
}

/// PUT /api/profile - 更新外观设置 (仅更新提供的字段)
pub async fn update(
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    validate_optional_text(&payload.business_name, "business_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.instagram_url, "instagram_url", MAX_URL_LEN)?;
    validate_optional_text(&payload.cover_image_url, "cover_image_url", MAX_URL_LEN)?;

    let profile = state.store.update_profile(&payload).await?;
    tracing::info!("Profile updated");

    state
        .broadcast_sync(RESOURCE, SyncAction::Updated, profile.id, Some(&profile))
        .await;

    Ok(Json(profile))
}
