use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::approval::{self, Decision, ListingSubmission, ListingUpdate};
use crate::db::server_timestamp;
use crate::entities::listing::{self, ListingStatus};
use crate::entities::StringList;
use crate::error::{AppError, AppResult};
use crate::repo::partners;
use crate::visibility::{
    featured_with_fallback, listing_scope, newest_first, traveler_condition, Audience,
    ListingSearch, FEATURED_LIMIT,
};

async fn find(db: &DatabaseConnection, listing_id: Uuid) -> AppResult<listing::Model> {
    listing::Entity::find_by_id(listing_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))
}

/// Fetch one listing as seen by `audience`. Listings outside the audience's
/// scope are reported as missing.
pub async fn get_visible<C: ConnectionTrait>(
    db: &C,
    audience: Audience,
    listing_id: Uuid,
) -> AppResult<listing::Model> {
    listing::Entity::find_by_id(listing_id)
        .filter(listing_scope(audience))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))
}

/// Listings in `audience`'s scope, optionally narrowed to one status,
/// newest first
pub async fn list_for(
    db: &DatabaseConnection,
    audience: Audience,
    status: Option<ListingStatus>,
) -> AppResult<Vec<listing::Model>> {
    let mut condition = listing_scope(audience);
    if let Some(status) = status {
        condition = condition.add(listing::Column::Status.eq(status));
    }

    Ok(newest_first(listing::Entity::find().filter(condition))
        .all(db)
        .await?)
}

/// Everything a traveler may browse
pub async fn approved(db: &DatabaseConnection) -> AppResult<Vec<listing::Model>> {
    list_for(db, Audience::Traveler, None).await
}

/// One partner's listings as a traveler sees them
pub async fn public_for_partner(
    db: &DatabaseConnection,
    partner_id: Uuid,
) -> AppResult<Vec<listing::Model>> {
    let condition = traveler_condition().add(listing::Column::PartnerId.eq(partner_id));
    Ok(newest_first(listing::Entity::find().filter(condition))
        .all(db)
        .await?)
}

/// Traveler search: structured filter in the store, text/location/tags after
pub async fn search(
    db: &DatabaseConnection,
    search: &ListingSearch,
) -> AppResult<Vec<listing::Model>> {
    search.validate()?;
    let candidates = newest_first(listing::Entity::find().filter(search.structured_condition()?))
        .all(db)
        .await?;

    let results = search.post_filter(candidates);
    tracing::debug!(count = results.len(), ?search, "Listing search");
    Ok(results)
}

pub async fn featured(db: &DatabaseConnection) -> AppResult<Vec<listing::Model>> {
    let primary = newest_first(listing::Entity::find().filter(traveler_condition()))
        .limit(FEATURED_LIMIT)
        .all(db)
        .await
        .map_err(AppError::from);

    featured_with_fallback(primary, || approved(db)).await
}

/// Create a listing for `partner_id`. The stored status is always pending.
pub async fn submit(
    db: &DatabaseConnection,
    partner_id: Uuid,
    input: ListingSubmission,
) -> AppResult<listing::Model> {
    let partner = partners::find(db, partner_id).await?;

    if let Some(status) = input.status {
        tracing::debug!(partner_id = %partner_id, ?status, "Ignoring client-supplied listing status");
    }
    let fields = input.validate()?;

    let now = server_timestamp();
    let new_listing = listing::ActiveModel {
        id: Set(Uuid::new_v4()),
        partner_id: Set(partner.user_id),
        title: Set(fields.title),
        description: Set(fields.description),
        category: Set(fields.category),
        location: Set(fields.location),
        price: Set(fields.price),
        currency: Set(fields.currency),
        start_date: Set(fields.start_date),
        end_date: Set(fields.end_date),
        images: Set(StringList(fields.images)),
        tags: Set(StringList(fields.tags)),
        status: Set(approval::submitted_listing_status()),
        is_active: Set(true),
        rejection_reason: Set(None),
        reviewed_at: Set(None),
        reviewed_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let listing = new_listing.insert(db).await?;
    tracing::info!(listing_id = %listing.id, partner_id = %partner_id, "Listing submitted for review");
    Ok(listing)
}

async fn find_owned(
    db: &DatabaseConnection,
    partner_id: Uuid,
    listing_id: Uuid,
) -> AppResult<listing::Model> {
    let listing = find(db, listing_id).await?;
    if listing.partner_id != partner_id {
        return Err(AppError::Forbidden(
            "You can only manage your own listings".to_string(),
        ));
    }
    Ok(listing)
}

/// Owner edit. Allowed at any status and leaves the status untouched.
pub async fn update_own(
    db: &DatabaseConnection,
    partner_id: Uuid,
    listing_id: Uuid,
    input: ListingUpdate,
) -> AppResult<listing::Model> {
    let current = find_owned(db, partner_id, listing_id).await?;
    let fields = input.apply(&current)?;

    let mut active: listing::ActiveModel = current.into();
    active.title = Set(fields.title);
    active.description = Set(fields.description);
    active.category = Set(fields.category);
    active.location = Set(fields.location);
    active.price = Set(fields.price);
    active.currency = Set(fields.currency);
    active.start_date = Set(fields.start_date);
    active.end_date = Set(fields.end_date);
    active.images = Set(StringList(fields.images));
    active.tags = Set(StringList(fields.tags));
    active.updated_at = Set(server_timestamp());

    Ok(active.update(db).await?)
}

pub async fn set_active(
    db: &DatabaseConnection,
    partner_id: Uuid,
    listing_id: Uuid,
    is_active: bool,
) -> AppResult<listing::Model> {
    let current = find_owned(db, partner_id, listing_id).await?;

    let mut active: listing::ActiveModel = current.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(server_timestamp());

    Ok(active.update(db).await?)
}

pub async fn delete_own(
    db: &DatabaseConnection,
    partner_id: Uuid,
    listing_id: Uuid,
) -> AppResult<()> {
    find_owned(db, partner_id, listing_id).await?;
    listing::Entity::delete_by_id(listing_id).exec(db).await?;
    tracing::info!(listing_id = %listing_id, partner_id = %partner_id, "Listing deleted");
    Ok(())
}

pub async fn approve(
    db: &DatabaseConnection,
    listing_id: Uuid,
    actor_id: Uuid,
) -> AppResult<listing::Model> {
    let current = find(db, listing_id).await?;
    moderate(db, listing_id, current.status, Decision::Approve, actor_id, None).await
}

pub async fn reject(
    db: &DatabaseConnection,
    listing_id: Uuid,
    actor_id: Uuid,
    reason: Option<String>,
) -> AppResult<listing::Model> {
    let current = find(db, listing_id).await?;
    moderate(db, listing_id, current.status, Decision::Reject, actor_id, reason).await
}

/// Apply an admin decision to a listing expected to be in `expected`.
///
/// Approval is refused while the owning partner is rejected. The
/// write is conditional on the stored status still being `expected`.
pub async fn moderate(
    db: &DatabaseConnection,
    listing_id: Uuid,
    expected: ListingStatus,
    decision: Decision,
    actor_id: Uuid,
    reason: Option<String>,
) -> AppResult<listing::Model> {
    let next = approval::listing_transition(expected, decision)?;

    if next == ListingStatus::Approved {
        let listing = find(db, listing_id).await?;
        let partner = partners::find(db, listing.partner_id).await?;
        approval::ensure_partner_can_publish(&partner)?;
    }

    let now = server_timestamp();
    let mut changes = listing::ActiveModel {
        status: Set(next),
        reviewed_at: Set(Some(now)),
        reviewed_by: Set(Some(actor_id)),
        updated_at: Set(now),
        ..Default::default()
    };
    if next == ListingStatus::Approved {
        changes.rejection_reason = Set(None);
    } else if let Some(reason) = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()) {
        changes.rejection_reason = Set(Some(reason));
    }

    let result = listing::Entity::update_many()
        .set(changes)
        .filter(listing::Column::Id.eq(listing_id))
        .filter(listing::Column::Status.eq(expected))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let current = find(db, listing_id).await?;
        tracing::warn!(
            listing_id = %listing_id,
            actor = %actor_id,
            expected = ?expected,
            found = ?current.status,
            "Listing status changed concurrently"
        );
        return Err(AppError::Conflict(
            "Listing status changed concurrently; reload and retry".to_string(),
        ));
    }

    tracing::info!(
        listing_id = %listing_id,
        actor = %actor_id,
        from = ?expected,
        to = ?next,
        "Listing moderated"
    );
    find(db, listing_id).await
}

/// Traveler-visible listings among `ids`, newest first
pub async fn visible_among(
    db: &DatabaseConnection,
    ids: Vec<Uuid>,
) -> AppResult<Vec<listing::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let condition = traveler_condition().add(listing::Column::Id.is_in(ids));
    Ok(newest_first(listing::Entity::find().filter(condition))
        .all(db)
        .await?)
}
