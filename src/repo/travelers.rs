use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::server_timestamp;
use crate::entities::traveler_profile;
use crate::entities::user::UserRole;
use crate::entities::StringList;
use crate::error::{AppError, AppResult};
use crate::repo::users;

#[derive(Debug, Clone, Deserialize)]
pub struct TravelerProfileInput {
    pub display_name: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default)]
    pub budget_min: f64,
    pub budget_max: f64,
    pub travel_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TravelerProfileUpdate {
    pub display_name: Option<String>,
    pub interests: Option<Vec<String>>,
    pub preferred_locations: Option<Vec<String>>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub travel_type: Option<String>,
}

impl TravelerProfileInput {
    fn validate(self) -> AppResult<Self> {
        let display_name = self.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AppError::Validation("display_name is required".to_string()));
        }
        let travel_type = self.travel_type.trim().to_string();
        if travel_type.is_empty() {
            return Err(AppError::Validation("travel_type is required".to_string()));
        }
        if !self.budget_min.is_finite() || !self.budget_max.is_finite() || self.budget_min < 0.0 {
            return Err(AppError::Validation(
                "budget must be a non-negative range".to_string(),
            ));
        }
        if self.budget_min > self.budget_max {
            return Err(AppError::Validation(
                "budget_min must not exceed budget_max".to_string(),
            ));
        }

        Ok(Self {
            display_name,
            travel_type,
            interests: clean(self.interests),
            preferred_locations: clean(self.preferred_locations),
            ..self
        })
    }
}

fn clean(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

pub async fn get(db: &DatabaseConnection, user_id: Uuid) -> AppResult<traveler_profile::Model> {
    traveler_profile::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Traveler profile not found".to_string()))
}

pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: TravelerProfileInput,
) -> AppResult<traveler_profile::Model> {
    let user = users::find(db, user_id).await?;
    users::ensure_verified_role(&user, UserRole::Traveler)?;
    let input = input.validate()?;

    if traveler_profile::Entity::find_by_id(user_id).one(db).await?.is_some() {
        return Err(AppError::Conflict("Traveler profile already exists".to_string()));
    }

    let now = server_timestamp();
    let profile = traveler_profile::ActiveModel {
        user_id: Set(user_id),
        display_name: Set(input.display_name),
        interests: Set(StringList(input.interests)),
        preferred_locations: Set(StringList(input.preferred_locations)),
        budget_min: Set(input.budget_min),
        budget_max: Set(input.budget_max),
        travel_type: Set(input.travel_type),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(profile.insert(db).await?)
}

/// Owner update; the merged record is re-validated as a whole
pub async fn update(
    db: &DatabaseConnection,
    user_id: Uuid,
    input: TravelerProfileUpdate,
) -> AppResult<traveler_profile::Model> {
    let current = get(db, user_id).await?;
    let merged = TravelerProfileInput {
        display_name: input.display_name.unwrap_or_else(|| current.display_name.clone()),
        interests: input.interests.unwrap_or_else(|| current.interests.0.clone()),
        preferred_locations: input
            .preferred_locations
            .unwrap_or_else(|| current.preferred_locations.0.clone()),
        budget_min: input.budget_min.unwrap_or(current.budget_min),
        budget_max: input.budget_max.unwrap_or(current.budget_max),
        travel_type: input.travel_type.unwrap_or_else(|| current.travel_type.clone()),
    }
    .validate()?;

    let mut active: traveler_profile::ActiveModel = current.into();
    active.display_name = Set(merged.display_name);
    active.interests = Set(StringList(merged.interests));
    active.preferred_locations = Set(StringList(merged.preferred_locations));
    active.budget_min = Set(merged.budget_min);
    active.budget_max = Set(merged.budget_max);
    active.travel_type = Set(merged.travel_type);
    active.updated_at = Set(server_timestamp());

    Ok(active.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(min: f64, max: f64) -> TravelerProfileInput {
        TravelerProfileInput {
            display_name: " Mira ".to_string(),
            interests: vec!["hiking".to_string(), "".to_string()],
            preferred_locations: vec![],
            budget_min: min,
            budget_max: max,
            travel_type: "solo".to_string(),
        }
    }

    #[test]
    fn test_budget_range_must_be_ordered() {
        assert!(input(100.0, 50.0).validate().is_err());
        assert!(input(-1.0, 50.0).validate().is_err());

        let ok = input(50.0, 50.0).validate().unwrap();
        assert_eq!(ok.display_name, "Mira");
        assert_eq!(ok.interests, vec!["hiking".to_string()]);
    }
}
