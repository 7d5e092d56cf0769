//! Profile Repository (singleton row, id = 1)

use super::{RepoError, RepoResult};
use shared::models::{Profile, ProfileUpdate};
use sqlx::SqlitePool;

const PROFILE_ID: i64 = 1;

pub async fn get(pool: &SqlitePool) -> RepoResult<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        "SELECT id, business_name, instagram_url, cover_image_url, updated_at FROM profile WHERE id = ?",
    )
    .bind(PROFILE_ID)
    .fetch_optional(pool)
    .await?;

    profile.ok_or_else(|| RepoError::NotFound("Profile row missing".to_string()))
}

/// Partial update; absent fields keep their value
pub async fn update(pool: &SqlitePool, data: &ProfileUpdate) -> RepoResult<Profile> {
    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE profile SET \
            business_name = COALESCE(?, business_name), \
            instagram_url = COALESCE(?, instagram_url), \
            cover_image_url = COALESCE(?, cover_image_url), \
            updated_at = ? \
         WHERE id = ?",
    )
    .bind(&data.business_name)
    .bind(&data.instagram_url)
    .bind(&data.cover_image_url)
    .bind(now)
    .bind(PROFILE_ID)
    .execute(pool)
    .await?;

    get(pool).await
}
