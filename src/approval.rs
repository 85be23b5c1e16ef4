//! Moderation lifecycle of partner profiles and listings.
//!
//! Everything here is pure: the store-facing code in `repo` reads the current
//! status, asks this module for the next one, and writes it back conditionally
//! on the status it read.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::entities::listing::{self, ListingCategory, ListingStatus};
use crate::entities::partner_profile::{self, PartnerStatus};
use crate::error::{AppError, AppResult};

/// Moderation events. `Submit` only applies to listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Submit,
    Approve,
    Reject,
}

/// Next partner status for an admin decision.
///
/// Re-applying the decision a partner already carries is allowed and yields
/// the same status; the caller still refreshes the timestamp.
pub fn partner_transition(from: PartnerStatus, decision: Decision) -> AppResult<PartnerStatus> {
    use PartnerStatus::*;

    match (from, decision) {
        (Pending | Approved, Decision::Approve) => Ok(Approved),
        (Pending | Rejected, Decision::Reject) => Ok(Rejected),
        (_, Decision::Submit) => Err(AppError::Conflict(
            "Partner profiles are submitted on creation".to_string(),
        )),
        (Approved, Decision::Reject) => Err(AppError::Conflict(
            "Partner is already approved".to_string(),
        )),
        (Rejected, Decision::Approve) => Err(AppError::Conflict(
            "Partner is already rejected".to_string(),
        )),
    }
}

/// Next listing status for a moderation event.
pub fn listing_transition(from: ListingStatus, decision: Decision) -> AppResult<ListingStatus> {
    use ListingStatus::*;

    match (from, decision) {
        (Draft, Decision::Submit) => Ok(Pending),
        (_, Decision::Submit) => Err(AppError::Conflict(
            "Only draft listings can be submitted".to_string(),
        )),
        (Draft, _) => Err(AppError::Conflict(
            "Listing has not been submitted for review".to_string(),
        )),
        (Pending | Approved, Decision::Approve) => Ok(Approved),
        (Pending | Rejected, Decision::Reject) => Ok(Rejected),
        (Approved, Decision::Reject) => Err(AppError::Conflict(
            "Listing is already approved".to_string(),
        )),
        (Rejected, Decision::Approve) => Err(AppError::Conflict(
            "Listing is already rejected".to_string(),
        )),
    }
}

/// Status every new listing is stored with, whatever the caller sent.
pub fn submitted_listing_status() -> ListingStatus {
    // Draft -> Pending is always legal
    listing_transition(ListingStatus::Draft, Decision::Submit).unwrap_or(ListingStatus::Pending)
}

/// A rejected partner's listings never become visible. Pending partners may
/// publish while their own review is outstanding.
pub fn ensure_partner_can_publish(partner: &partner_profile::Model) -> AppResult<()> {
    if partner.status == PartnerStatus::Rejected {
        return Err(AppError::Conflict(format!(
            "Partner {} is rejected; its listings cannot be approved",
            partner.user_id
        )));
    }
    Ok(())
}

// ============ Partner submissions ============

#[derive(Debug, Clone, Deserialize)]
pub struct PartnerSubmission {
    pub business_name: String,
    pub address: String,
    pub phone: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub website: Option<String>,
    /// Accepted so clients can round-trip records; never trusted
    #[serde(default)]
    pub status: Option<PartnerStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerUpdate {
    pub business_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub website: Option<String>,
}

/// Business fields of a partner after validation
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerFields {
    pub business_name: String,
    pub address: String,
    pub phone: String,
    pub description: String,
    pub category: String,
    pub website: Option<String>,
}

impl PartnerSubmission {
    pub fn validate(self) -> AppResult<PartnerFields> {
        Ok(PartnerFields {
            business_name: required("business_name", &self.business_name)?,
            address: required("address", &self.address)?,
            phone: required("phone", &self.phone)?,
            description: required("description", &self.description)?,
            category: required("category", &self.category)?,
            website: optional(self.website),
        })
    }
}

impl PartnerUpdate {
    /// Merge into the stored business fields and validate the result
    pub fn apply(self, current: &partner_profile::Model) -> AppResult<PartnerFields> {
        PartnerSubmission {
            business_name: self.business_name.unwrap_or_else(|| current.business_name.clone()),
            address: self.address.unwrap_or_else(|| current.address.clone()),
            phone: self.phone.unwrap_or_else(|| current.phone.clone()),
            description: self.description.unwrap_or_else(|| current.description.clone()),
            category: self.category.unwrap_or_else(|| current.category.clone()),
            website: self.website.or_else(|| current.website.clone()),
            status: None,
        }
        .validate()
    }
}

// ============ Listing submissions ============

#[derive(Debug, Clone, Deserialize)]
pub struct ListingSubmission {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub location: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Accepted so clients can round-trip records; never trusted
    #[serde(default)]
    pub status: Option<ListingStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Editable listing fields after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub description: String,
    pub category: ListingCategory,
    pub location: String,
    pub price: f64,
    pub currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl ListingSubmission {
    pub fn validate(self) -> AppResult<ListingFields> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let category = self
            .category
            .parse::<ListingCategory>()
            .map_err(AppError::Validation)?;

        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }

        let currency = self.currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(
                "currency must be a three-letter code".to_string(),
            ));
        }

        if self.start_date > self.end_date {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }

        let images = self
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        Ok(ListingFields {
            title,
            description,
            category,
            location: self.location.trim().to_string(),
            price: self.price,
            currency,
            start_date: self.start_date,
            end_date: self.end_date,
            images,
            tags: normalize_tags(self.tags),
        })
    }
}

impl ListingUpdate {
    /// Merge into the stored listing and validate the result. Status is not
    /// part of an update and is left as it is.
    pub fn apply(self, current: &listing::Model) -> AppResult<ListingFields> {
        ListingSubmission {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self.description.unwrap_or_else(|| current.description.clone()),
            category: match self.category {
                Some(category) => category,
                None => category_name(current.category).to_string(),
            },
            location: self.location.unwrap_or_else(|| current.location.clone()),
            price: self.price.unwrap_or(current.price),
            currency: self.currency.unwrap_or_else(|| current.currency.clone()),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            images: self.images.unwrap_or_else(|| current.images.0.clone()),
            tags: self.tags.unwrap_or_else(|| current.tags.0.clone()),
            status: None,
        }
        .validate()
    }
}

fn category_name(category: ListingCategory) -> &'static str {
    match category {
        ListingCategory::Tour => "tour",
        ListingCategory::Accommodation => "accommodation",
        ListingCategory::Transport => "transport",
        ListingCategory::Activity => "activity",
    }
}

/// Trim, drop blanks and deduplicate while keeping first-seen order
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            out.push(tag);
        }
    }
    out
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_input() -> ListingSubmission {
        ListingSubmission {
            title: "Sunset boat tour".to_string(),
            description: "Two hours along the coast".to_string(),
            category: "tour".to_string(),
            location: "Split".to_string(),
            price: 45.0,
            currency: "eur".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            images: vec!["https://img/1.jpg".to_string(), " ".to_string()],
            tags: vec!["boat".to_string(), " Boat ".to_string(), "sunset".to_string()],
            status: Some(ListingStatus::Approved),
        }
    }

    #[test]
    fn test_partner_transitions() {
        use PartnerStatus::*;

        assert_eq!(partner_transition(Pending, Decision::Approve).unwrap(), Approved);
        assert_eq!(partner_transition(Pending, Decision::Reject).unwrap(), Rejected);
        assert_eq!(partner_transition(Approved, Decision::Approve).unwrap(), Approved);
        assert_eq!(partner_transition(Rejected, Decision::Reject).unwrap(), Rejected);
        assert!(partner_transition(Approved, Decision::Reject).is_err());
        assert!(partner_transition(Rejected, Decision::Approve).is_err());
        assert!(partner_transition(Pending, Decision::Submit).is_err());
    }

    #[test]
    fn test_listing_transitions() {
        use ListingStatus::*;

        assert_eq!(listing_transition(Draft, Decision::Submit).unwrap(), Pending);
        assert_eq!(listing_transition(Pending, Decision::Approve).unwrap(), Approved);
        assert_eq!(listing_transition(Pending, Decision::Reject).unwrap(), Rejected);
        assert_eq!(listing_transition(Rejected, Decision::Reject).unwrap(), Rejected);
        assert_eq!(listing_transition(Approved, Decision::Approve).unwrap(), Approved);

        assert!(matches!(
            listing_transition(Rejected, Decision::Approve),
            Err(AppError::Conflict(_))
        ));
        assert!(listing_transition(Draft, Decision::Approve).is_err());
        assert!(listing_transition(Pending, Decision::Submit).is_err());
        assert_eq!(submitted_listing_status(), Pending);
    }

    #[test]
    fn test_listing_validation_normalizes_fields() {
        let fields = listing_input().validate().unwrap();
        assert_eq!(fields.category, ListingCategory::Tour);
        assert_eq!(fields.currency, "EUR");
        assert_eq!(fields.images, vec!["https://img/1.jpg".to_string()]);
        assert_eq!(fields.tags, vec!["boat".to_string(), "sunset".to_string()]);
    }

    #[test]
    fn test_listing_validation_rejects_bad_input() {
        let mut input = listing_input();
        input.price = -1.0;
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let mut input = listing_input();
        input.start_date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let mut input = listing_input();
        input.category = "cruise".to_string();
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let mut input = listing_input();
        input.title = "   ".to_string();
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let mut input = listing_input();
        input.price = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_partner_submission_requires_business_fields() {
        let input = PartnerSubmission {
            business_name: "Adriatic Tours".to_string(),
            address: "Riva 1, Split".to_string(),
            phone: "+385 21 000".to_string(),
            description: "".to_string(),
            category: "tours".to_string(),
            website: None,
            status: Some(PartnerStatus::Approved),
        };
        match input.validate() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("description")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
