//! Which listings and partners each caller may see.
//!
//! Traveler-facing reads always start from [`traveler_condition`]; narrowing
//! filters are layered on top of it, never instead of it.

use std::future::Future;

use sea_orm::sea_query::Query;
use sea_orm::{ColumnTrait, Condition, QueryOrder, Select};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::listing::{self, ListingCategory, ListingStatus};
use crate::entities::partner_profile::{self, PartnerStatus};
use crate::entities::user::UserRole;
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;

/// Featured listings are capped at this many records
pub const FEATURED_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Anonymous or authenticated traveler
    Traveler,
    /// A partner looking at its own records
    Partner(Uuid),
    Admin,
}

impl Audience {
    pub fn from_claims(claims: Option<&Claims>) -> Self {
        match claims {
            Some(c) if c.role == UserRole::Admin => Audience::Admin,
            Some(c) if c.role == UserRole::Partner => Audience::Partner(c.sub),
            _ => Audience::Traveler,
        }
    }
}

/// The listing's own half of the traveler rule: approved and active.
/// Partner standing is only known to the store; see [`traveler_condition`].
pub fn is_publicly_visible(listing: &listing::Model) -> bool {
    listing.status == ListingStatus::Approved && listing.is_active
}

/// Store-side traveler rule: approved, active, and not owned by a rejected
/// partner. Rejecting a partner hides listings approved before the rejection.
pub fn traveler_condition() -> Condition {
    let rejected_partners = Query::select()
        .column(partner_profile::Column::UserId)
        .from(partner_profile::Entity)
        .and_where(partner_profile::Column::Status.eq(PartnerStatus::Rejected))
        .to_owned();

    Condition::all()
        .add(listing::Column::Status.eq(ListingStatus::Approved))
        .add(listing::Column::IsActive.eq(true))
        .add(listing::Column::PartnerId.not_in_subquery(rejected_partners))
}

/// Base condition for listing reads by `audience`
pub fn listing_scope(audience: Audience) -> Condition {
    match audience {
        Audience::Traveler => traveler_condition(),
        Audience::Partner(id) => Condition::all().add(listing::Column::PartnerId.eq(id)),
        Audience::Admin => Condition::all(),
    }
}

/// Newest first, id as tie-break
pub fn newest_first(select: Select<listing::Entity>) -> Select<listing::Entity> {
    select
        .order_by_desc(listing::Column::CreatedAt)
        .order_by_desc(listing::Column::Id)
}

/// In-memory counterpart of [`newest_first`]
pub fn sort_newest_first(listings: &mut [listing::Model]) {
    listings.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Traveler search parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingSearch {
    /// Free text matched against title, description and tags
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub location: Option<String>,
    /// Comma separated; a listing matches when it carries any of them
    pub tags: Option<String>,
}

impl ListingSearch {
    /// Filter applied by the store. The approved-only constraint comes first.
    pub fn structured_condition(&self) -> AppResult<Condition> {
        let mut condition = traveler_condition();

        if let Some(category) = self.category_filter()? {
            condition = condition.add(listing::Column::Category.eq(category));
        }
        if let Some(min) = self.min_price {
            condition = condition.add(listing::Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            condition = condition.add(listing::Column::Price.lte(max));
        }

        Ok(condition)
    }

    fn category_filter(&self) -> AppResult<Option<ListingCategory>> {
        match self.category.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<ListingCategory>()
                .map(Some)
                .map_err(AppError::Validation),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        for price in [self.min_price, self.max_price].into_iter().flatten() {
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::Validation(
                    "price filters must be non-negative numbers".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::Validation(
                    "min_price must not exceed max_price".to_string(),
                ));
            }
        }
        self.category_filter().map(|_| ())
    }

    /// Second pass over records already returned by the structured query.
    /// It can only drop records.
    pub fn post_filter(&self, listings: Vec<listing::Model>) -> Vec<listing::Model> {
        let tags = self.tag_filter();
        listings
            .into_iter()
            .filter(|l| {
                self.q.as_deref().is_none_or(|q| matches_text(l, q))
                    && self.location.as_deref().is_none_or(|loc| matches_location(l, loc))
                    && (tags.is_empty() || tags.iter().any(|t| has_tag(l, t)))
            })
            .collect()
    }

    fn tag_filter(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Case-insensitive substring match on title, description or any tag
pub fn matches_text(listing: &listing::Model, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    listing.title.to_lowercase().contains(&needle)
        || listing.description.to_lowercase().contains(&needle)
        || listing.tags.0.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Case-insensitive substring match on the location field
pub fn matches_location(listing: &listing::Model, location: &str) -> bool {
    let needle = location.trim().to_lowercase();
    needle.is_empty() || listing.location.to_lowercase().contains(&needle)
}

fn has_tag(listing: &listing::Model, tag: &str) -> bool {
    listing.tags.0.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

/// Featured listings degrade to the full approved set when the capped read
/// fails. Both paths are re-checked against the traveler rule.
pub async fn featured_with_fallback<F, Fut>(
    primary: AppResult<Vec<listing::Model>>,
    fallback: F,
) -> AppResult<Vec<listing::Model>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = AppResult<Vec<listing::Model>>>,
{
    let mut listings = match primary {
        Ok(listings) => listings,
        Err(e) => {
            tracing::warn!(error = %e, "Featured listings query failed, using approved set");
            fallback().await?
        }
    };

    listings.retain(is_publicly_visible);
    sort_newest_first(&mut listings);
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::entities::StringList;

    fn fixture(title: &str, status: ListingStatus, minutes: i64) -> listing::Model {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        listing::Model {
            id: Uuid::new_v4(),
            partner_id: Uuid::nil(),
            title: title.to_string(),
            description: "A day out".to_string(),
            category: ListingCategory::Tour,
            location: "Lisbon, Portugal".to_string(),
            price: 30.0,
            currency: "EUR".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            images: StringList::default(),
            tags: StringList(vec!["Beach".to_string(), "family".to_string()]),
            status,
            is_active: true,
            rejection_reason: None,
            reviewed_at: None,
            reviewed_by: None,
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    #[test]
    fn test_public_visibility_needs_approved_and_active() {
        let mut l = fixture("Surf", ListingStatus::Approved, 0);
        assert!(is_publicly_visible(&l));
        l.is_active = false;
        assert!(!is_publicly_visible(&l));
        for status in [ListingStatus::Draft, ListingStatus::Pending, ListingStatus::Rejected] {
            assert!(!is_publicly_visible(&fixture("x", status, 0)));
        }
    }

    #[test]
    fn test_text_match_covers_title_description_and_tags() {
        let l = fixture("Old town walk", ListingStatus::Approved, 0);
        assert!(matches_text(&l, "TOWN"));
        assert!(matches_text(&l, "day out"));
        assert!(matches_text(&l, "beach"));
        assert!(!matches_text(&l, "mountain"));
        assert!(matches_location(&l, "portugal"));
        assert!(!matches_location(&l, "spain"));
    }

    #[test]
    fn test_post_filter_only_narrows() {
        let listings = vec![
            fixture("Beach day", ListingStatus::Approved, 0),
            fixture("Museum", ListingStatus::Approved, 1),
        ];
        let search = ListingSearch {
            q: Some("museum".to_string()),
            ..Default::default()
        };
        let out = search.post_filter(listings.clone());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Museum");

        let search = ListingSearch {
            tags: Some("nightlife, FAMILY".to_string()),
            ..Default::default()
        };
        assert_eq!(search.post_filter(listings).len(), 2);
    }

    #[test]
    fn test_search_validation() {
        let search = ListingSearch {
            min_price: Some(50.0),
            max_price: Some(10.0),
            ..Default::default()
        };
        assert!(search.validate().is_err());

        let search = ListingSearch {
            category: Some("spaceflight".to_string()),
            ..Default::default()
        };
        assert!(matches!(search.validate(), Err(AppError::Validation(_))));
        assert!(ListingSearch::default().validate().is_ok());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut listings = vec![
            fixture("a", ListingStatus::Approved, 1),
            fixture("b", ListingStatus::Approved, 3),
            fixture("c", ListingStatus::Approved, 2),
        ];
        sort_newest_first(&mut listings);
        let titles: Vec<_> = listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_featured_fallback_reapplies_visibility() {
        let fallback_rows = vec![
            fixture("approved", ListingStatus::Approved, 0),
            fixture("pending", ListingStatus::Pending, 1),
        ];
        let out = featured_with_fallback(
            Err(AppError::Store(sea_orm::DbErr::Custom("index missing".to_string()))),
            || async { Ok(fallback_rows) },
        )
        .await
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "approved");
    }

    #[tokio::test]
    async fn test_featured_fallback_propagates_second_failure() {
        let out = featured_with_fallback(
            Err(AppError::Store(sea_orm::DbErr::Custom("a".to_string()))),
            || async { Err(AppError::Store(sea_orm::DbErr::Custom("b".to_string()))) },
        )
        .await;
        assert!(out.is_err());
    }
}
