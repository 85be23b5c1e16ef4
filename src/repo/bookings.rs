use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Iterable,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::server_timestamp;
use crate::entities::booking::{self, BookingStatus, PaymentStatus};
use crate::entities::listing;
use crate::error::{AppError, AppResult};
use crate::repo::listings;
use crate::visibility::{listing_scope, Audience};

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub listing_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "one_guest")]
    pub guests: i32,
}

fn one_guest() -> i32 {
    1
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Stays are half-open: leaving on a day frees it for the next arrival
pub fn ranges_overlap(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Bookings on `listing_id` that hold dates overlapping `[start, end)`
async fn conflicting<C: ConnectionTrait>(
    conn: &C,
    listing_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<booking::Model>> {
    let holding: Vec<BookingStatus> = BookingStatus::iter().filter(|s| s.holds_dates()).collect();
    let held = booking::Entity::find()
        .filter(booking::Column::ListingId.eq(listing_id))
        .filter(booking::Column::Status.is_in(holding))
        .all(conn)
        .await?;

    Ok(held
        .into_iter()
        .filter(|b| ranges_overlap((start, end), (b.start_date, b.end_date)))
        .collect())
}

fn validate_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start > end {
        return Err(AppError::Validation(
            "start_date must not be after end_date".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub listing_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub within_window: bool,
    pub conflicting_bookings: usize,
    pub available: bool,
}

/// Whether a traveler-visible listing can be booked for the range
pub async fn check_availability(
    db: &DatabaseConnection,
    listing_id: Uuid,
    query: AvailabilityQuery,
) -> AppResult<Availability> {
    validate_range(query.start_date, query.end_date)?;
    let listing = listings::get_visible(db, Audience::Traveler, listing_id).await?;

    let within_window = query.start_date >= listing.start_date && query.end_date <= listing.end_date;
    let conflicts = conflicting(db, listing.id, query.start_date, query.end_date).await?.len();

    Ok(Availability {
        listing_id: listing.id,
        start_date: query.start_date,
        end_date: query.end_date,
        within_window,
        conflicting_bookings: conflicts,
        available: within_window && conflicts == 0,
    })
}

/// Create a booking. The listing row is locked for the duration of the
/// transaction, so concurrent requests for the same listing run the overlap
/// check one after the other.
pub async fn create(
    db: &DatabaseConnection,
    traveler_id: Uuid,
    request: BookingRequest,
) -> AppResult<booking::Model> {
    if request.guests <= 0 {
        return Err(AppError::Validation("Must book for at least 1 guest".to_string()));
    }
    validate_range(request.start_date, request.end_date)?;

    let txn = db.begin().await?;

    let listing = listing::Entity::find_by_id(request.listing_id)
        .filter(listing_scope(Audience::Traveler))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

    if request.start_date < listing.start_date || request.end_date > listing.end_date {
        return Err(AppError::Validation(format!(
            "Listing is only available from {} to {}",
            listing.start_date, listing.end_date
        )));
    }

    let conflicts = conflicting(&txn, listing.id, request.start_date, request.end_date)
        .await?
        .len();
    if conflicts > 0 {
        return Err(AppError::Conflict(format!(
            "Dates conflict with {} existing booking(s)",
            conflicts
        )));
    }

    let now = server_timestamp();
    let new_booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        listing_id: Set(listing.id),
        traveler_id: Set(traveler_id),
        partner_id: Set(listing.partner_id),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        guests: Set(request.guests),
        total_price: Set(listing.price * f64::from(request.guests)),
        currency: Set(listing.currency.clone()),
        status: Set(BookingStatus::Pending),
        payment_status: Set(PaymentStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let booking = new_booking.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, listing_id = %listing.id, "Booking created");
    Ok(booking)
}

#[derive(Debug, Serialize)]
pub struct ListingStats {
    pub listing_id: Uuid,
    pub total_bookings: usize,
    pub confirmed_bookings: usize,
    pub cancelled_bookings: usize,
    /// Sum over confirmed and completed bookings, in the listing's currency
    pub revenue: f64,
    pub currency: String,
}

/// Booking figures for one of the partner's own listings
pub async fn listing_stats(
    db: &DatabaseConnection,
    partner_id: Uuid,
    listing_id: Uuid,
) -> AppResult<ListingStats> {
    let listing = listings::get_visible(db, Audience::Partner(partner_id), listing_id).await?;

    let all = booking::Entity::find()
        .filter(booking::Column::ListingId.eq(listing.id))
        .all(db)
        .await?;

    let earning = |b: &&booking::Model| {
        matches!(b.status, BookingStatus::Confirmed | BookingStatus::Completed)
    };

    Ok(ListingStats {
        listing_id: listing.id,
        total_bookings: all.len(),
        confirmed_bookings: all.iter().filter(|b| b.status == BookingStatus::Confirmed).count(),
        cancelled_bookings: all.iter().filter(|b| b.status == BookingStatus::Cancelled).count(),
        revenue: all.iter().filter(earning).map(|b| b.total_price).sum(),
        currency: listing.currency,
    })
}

async fn find(db: &DatabaseConnection, booking_id: Uuid) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

pub async fn list_for_traveler(
    db: &DatabaseConnection,
    traveler_id: Uuid,
) -> AppResult<Vec<booking::Model>> {
    Ok(booking::Entity::find()
        .filter(booking::Column::TravelerId.eq(traveler_id))
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn list_for_partner(
    db: &DatabaseConnection,
    partner_id: Uuid,
) -> AppResult<Vec<booking::Model>> {
    Ok(booking::Entity::find()
        .filter(booking::Column::PartnerId.eq(partner_id))
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn list_all(db: &DatabaseConnection) -> AppResult<Vec<booking::Model>> {
    Ok(booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await?)
}

/// Traveler cancellation of their own booking
pub async fn cancel(
    db: &DatabaseConnection,
    traveler_id: Uuid,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    let booking = find(db, booking_id).await?;

    // Verify ownership
    if booking.traveler_id != traveler_id {
        return Err(AppError::Forbidden(
            "You can only cancel your own bookings".to_string(),
        ));
    }

    apply_status(db, booking, BookingStatusUpdate {
        status: Some(BookingStatus::Cancelled),
        payment_status: None,
    })
    .await
}

/// Partner update of a booking on one of its listings
pub async fn update_for_partner(
    db: &DatabaseConnection,
    partner_id: Uuid,
    booking_id: Uuid,
    update: BookingStatusUpdate,
) -> AppResult<booking::Model> {
    let booking = find(db, booking_id).await?;
    if booking.partner_id != partner_id {
        return Err(AppError::Forbidden(
            "You can only manage bookings on your own listings".to_string(),
        ));
    }
    apply_status(db, booking, update).await
}

async fn apply_status(
    db: &DatabaseConnection,
    booking: booking::Model,
    update: BookingStatusUpdate,
) -> AppResult<booking::Model> {
    if update.status.is_none() && update.payment_status.is_none() {
        return Err(AppError::Validation("Nothing to update".to_string()));
    }

    let from = (booking.status, booking.payment_status);
    let mut active: booking::ActiveModel = booking.into();

    if let Some(status) = update.status {
        if !from.0.can_become(status) {
            return Err(AppError::Conflict(format!(
                "Booking cannot move from {:?} to {:?}",
                from.0, status
            )));
        }
        active.status = Set(status);
    }
    if let Some(payment) = update.payment_status {
        if !from.1.can_become(payment) {
            return Err(AppError::Conflict(format!(
                "Payment cannot move from {:?} to {:?}",
                from.1, payment
            )));
        }
        active.payment_status = Set(payment);
    }
    active.updated_at = Set(server_timestamp());

    let updated = active.update(db).await?;
    tracing::info!(
        booking_id = %updated.id,
        status = ?updated.status,
        payment_status = ?updated.payment_status,
        "Booking updated"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, day).unwrap()
    }

    #[test]
    fn test_ranges_overlap() {
        assert!(ranges_overlap((d(1), d(5)), (d(4), d(8))));
        assert!(ranges_overlap((d(2), d(3)), (d(1), d(10))));
        // Checkout day is free for the next check-in
        assert!(!ranges_overlap((d(1), d(5)), (d(5), d(8))));
        assert!(!ranges_overlap((d(10), d(12)), (d(1), d(5))));
    }
}
