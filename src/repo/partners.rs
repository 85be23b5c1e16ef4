use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::approval::{self, Decision, PartnerSubmission, PartnerUpdate};
use crate::db::server_timestamp;
use crate::entities::partner_profile::{self, PartnerStatus};
use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::repo::users;

pub async fn find(db: &DatabaseConnection, partner_id: Uuid) -> AppResult<partner_profile::Model> {
    partner_profile::Entity::find_by_id(partner_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Partner profile not found".to_string()))
}

/// Create the partner profile for `user_id`. Status always starts at pending.
pub async fn submit(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: PartnerSubmission,
) -> AppResult<partner_profile::Model> {
    let user = users::find(db, user_id).await?;
    users::ensure_verified_role(&user, UserRole::Partner)?;

    if let Some(status) = input.status {
        tracing::debug!(user_id = %user_id, ?status, "Ignoring client-supplied partner status");
    }
    let fields = input.validate()?;

    if partner_profile::Entity::find_by_id(user_id).one(db).await?.is_some() {
        return Err(AppError::Conflict("Partner profile already exists".to_string()));
    }

    let now = server_timestamp();
    let profile = partner_profile::ActiveModel {
        user_id: Set(user_id),
        business_name: Set(fields.business_name),
        address: Set(fields.address),
        phone: Set(fields.phone),
        description: Set(fields.description),
        category: Set(fields.category),
        website: Set(fields.website),
        status: Set(PartnerStatus::Pending),
        rejection_reason: Set(None),
        approved_at: Set(None),
        approved_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let profile = profile.insert(db).await?;
    tracing::info!(partner_id = %profile.user_id, "Partner profile submitted for review");
    Ok(profile)
}

/// Owner edit of business fields. Status fields are not reachable from here.
pub async fn update_business(
    db: &DatabaseConnection,
    partner_id: Uuid,
    input: PartnerUpdate,
) -> AppResult<partner_profile::Model> {
    let current = find(db, partner_id).await?;
    let fields = input.apply(&current)?;

    let mut active: partner_profile::ActiveModel = current.into();
    active.business_name = Set(fields.business_name);
    active.address = Set(fields.address);
    active.phone = Set(fields.phone);
    active.description = Set(fields.description);
    active.category = Set(fields.category);
    active.website = Set(fields.website);
    active.updated_at = Set(server_timestamp());

    Ok(active.update(db).await?)
}

/// Admin view: every partner, or only those in `status`
pub async fn list(
    db: &DatabaseConnection,
    status: Option<PartnerStatus>,
) -> AppResult<Vec<partner_profile::Model>> {
    let mut query = partner_profile::Entity::find();
    if let Some(status) = status {
        query = query.filter(partner_profile::Column::Status.eq(status));
    }

    Ok(query
        .order_by_desc(partner_profile::Column::CreatedAt)
        .order_by_desc(partner_profile::Column::UserId)
        .all(db)
        .await?)
}

pub async fn approve(
    db: &DatabaseConnection,
    partner_id: Uuid,
    actor_id: Uuid,
) -> AppResult<partner_profile::Model> {
    decide(db, partner_id, Decision::Approve, actor_id, None).await
}

pub async fn reject(
    db: &DatabaseConnection,
    partner_id: Uuid,
    actor_id: Uuid,
    reason: Option<String>,
) -> AppResult<partner_profile::Model> {
    decide(db, partner_id, Decision::Reject, actor_id, reason).await
}

async fn decide(
    db: &DatabaseConnection,
    partner_id: Uuid,
    decision: Decision,
    actor_id: Uuid,
    reason: Option<String>,
) -> AppResult<partner_profile::Model> {
    let current = find(db, partner_id).await?;
    moderate(db, partner_id, current.status, decision, actor_id, reason).await
}

/// Apply an admin decision to a partner expected to be in `expected`.
///
/// The write only lands if the stored status still equals `expected`;
/// otherwise nothing changes and `Conflict` is returned.
pub async fn moderate(
    db: &DatabaseConnection,
    partner_id: Uuid,
    expected: PartnerStatus,
    decision: Decision,
    actor_id: Uuid,
    reason: Option<String>,
) -> AppResult<partner_profile::Model> {
    let next = approval::partner_transition(expected, decision)?;

    let now = server_timestamp();
    let mut changes = partner_profile::ActiveModel {
        status: Set(next),
        updated_at: Set(now),
        ..Default::default()
    };
    if decision == Decision::Approve {
        changes.approved_at = Set(Some(now));
        changes.approved_by = Set(Some(actor_id));
    } else if let Some(reason) = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()) {
        changes.rejection_reason = Set(Some(reason));
    }

    let result = partner_profile::Entity::update_many()
        .set(changes)
        .filter(partner_profile::Column::UserId.eq(partner_id))
        .filter(partner_profile::Column::Status.eq(expected))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let current = find(db, partner_id).await?;
        tracing::warn!(
            partner_id = %partner_id,
            actor = %actor_id,
            expected = ?expected,
            found = ?current.status,
            "Partner status changed concurrently"
        );
        return Err(AppError::Conflict(
            "Partner status changed concurrently; reload and retry".to_string(),
        ));
    }

    tracing::info!(
        partner_id = %partner_id,
        actor = %actor_id,
        from = ?expected,
        to = ?next,
        "Partner moderated"
    );
    find(db, partner_id).await
}
