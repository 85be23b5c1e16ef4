use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::db::server_timestamp;
use crate::entities::{favorite, listing};
use crate::error::{AppError, AppResult};
use crate::repo::listings;
use crate::visibility::Audience;

/// Favorite a listing. Only listings a traveler can see may be favorited;
/// favoriting twice is a no-op.
pub async fn add(db: &DatabaseConnection, user_id: Uuid, listing_id: Uuid) -> AppResult<()> {
    listings::get_visible(db, Audience::Traveler, listing_id).await?;

    if favorite::Entity::find_by_id((user_id, listing_id))
        .one(db)
        .await?
        .is_some()
    {
        return Ok(());
    }

    favorite::ActiveModel {
        user_id: Set(user_id),
        listing_id: Set(listing_id),
        created_at: Set(server_timestamp()),
    }
    .insert(db)
    .await?;

    Ok(())
}

pub async fn remove(db: &DatabaseConnection, user_id: Uuid, listing_id: Uuid) -> AppResult<()> {
    let result = favorite::Entity::delete_by_id((user_id, listing_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }
    Ok(())
}

/// Favorited listings that are still visible to travelers
pub async fn list(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Vec<listing::Model>> {
    let ids = favorite::Entity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|f| f.listing_id)
        .collect();

    listings::visible_among(db, ids).await
}
