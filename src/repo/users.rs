use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::server_timestamp;
use crate::entities::user::{self, UserRole};
use crate::entities::{partner_profile, traveler_profile};
use crate::error::{AppError, AppResult};
use crate::session::{Identity, SessionSnapshot};
use crate::utils::jwt::Claims;
use crate::utils::verification::generate_token;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    Ok(email)
}

/// Create a traveler or partner account. The returned token must be handed
/// to the mail collaborator.
pub async fn register(
    db: &DatabaseConnection,
    input: Registration,
) -> AppResult<(user::Model, String)> {
    if input.role == UserRole::Admin {
        return Err(AppError::Forbidden(
            "Admin accounts cannot be registered".to_string(),
        ));
    }

    let email = normalize_email(&input.email)?;
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if input.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let token = generate_token();
    let now = server_timestamp();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&input.password)?),
        name: Set(name),
        role: Set(input.role),
        email_verified: Set(false),
        verification_token: Set(Some(token.clone())),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let user = new_user.insert(db).await?;
    tracing::info!(user_id = %user.id, role = ?user.role, "User registered");
    Ok((user, token))
}

pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> AppResult<user::Model> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid email or password".to_string()))?;

    Ok(user)
}

pub async fn find(db: &DatabaseConnection, user_id: Uuid) -> AppResult<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn list_all(db: &DatabaseConnection) -> AppResult<Vec<user::Model>> {
    Ok(user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Profiles may only be created by verified accounts of the matching role
pub fn ensure_verified_role(user: &user::Model, role: UserRole) -> AppResult<()> {
    if user.role != role {
        return Err(AppError::Forbidden(format!(
            "Only {:?} accounts can do this",
            role
        )));
    }
    if !user.email_verified {
        return Err(AppError::Forbidden("Email address is not verified".to_string()));
    }
    Ok(())
}

/// Issue a fresh verification token for an unverified account
pub async fn issue_verification(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> AppResult<(user::Model, String)> {
    let user = find(db, user_id).await?;
    if user.email_verified {
        return Err(AppError::Conflict("Email is already verified".to_string()));
    }

    let token = generate_token();
    let mut active: user::ActiveModel = user.into();
    active.verification_token = Set(Some(token.clone()));
    active.updated_at = Set(server_timestamp());
    let user = active.update(db).await?;

    Ok((user, token))
}

/// Flip `email_verified` to true. Only ever succeeds once per account.
pub async fn verify_email(db: &DatabaseConnection, token: &str) -> AppResult<user::Model> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Validation("token is required".to_string()));
    }

    let user = user::Entity::find()
        .filter(user::Column::VerificationToken.eq(token))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown or used verification token".to_string()))?;

    let result = user::Entity::update_many()
        .set(user::ActiveModel {
            email_verified: Set(true),
            verification_token: Set(None),
            updated_at: Set(server_timestamp()),
            ..Default::default()
        })
        .filter(user::Column::Id.eq(user.id))
        .filter(user::Column::EmailVerified.eq(false))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict("Email is already verified".to_string()));
    }

    tracing::info!(user_id = %user.id, "Email verified");
    find(db, user.id).await
}

/// Seed the admin account if it doesn't exist
pub async fn seed_admin(db: &DatabaseConnection, email: &str, password: &str) -> AppResult<()> {
    let email = normalize_email(email)?;
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let now = server_timestamp();
    let admin = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        password_hash: Set(hash_password(password)?),
        name: Set("Admin".to_string()),
        role: Set(UserRole::Admin),
        email_verified: Set(true),
        verification_token: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    admin.insert(db).await?;
    tracing::info!("Admin account created: {}", email);
    Ok(())
}

/// Whether the profile matching the user's role exists. Admins have none.
pub async fn has_role_profile(db: &DatabaseConnection, user: &user::Model) -> AppResult<bool> {
    Ok(match user.role {
        UserRole::Admin => false,
        UserRole::Partner => partner_profile::Entity::find_by_id(user.id)
            .one(db)
            .await?
            .is_some(),
        UserRole::Traveler => traveler_profile::Entity::find_by_id(user.id)
            .one(db)
            .await?
            .is_some(),
    })
}

/// Build the session snapshot for a caller from the store, re-reading the
/// verification flag rather than trusting the token.
pub async fn session_snapshot(
    db: &DatabaseConnection,
    claims: Option<&Claims>,
    onboarding_complete: bool,
) -> AppResult<SessionSnapshot> {
    let Some(claims) = claims else {
        return Ok(SessionSnapshot {
            onboarding_complete,
            ..Default::default()
        });
    };

    // A token for a deleted account counts as signed out
    let Some(user) = user::Entity::find_by_id(claims.sub).one(db).await? else {
        return Ok(SessionSnapshot {
            onboarding_complete,
            ..Default::default()
        });
    };

    let has_profile = has_role_profile(db, &user).await?;
    Ok(SessionSnapshot {
        onboarding_complete,
        identity: Some(Identity {
            user_id: user.id,
            email: user.email,
            role: user.role,
            email_verified: user.email_verified,
        }),
        has_profile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ana@localhost").is_err());
    }
}
