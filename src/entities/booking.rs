use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl BookingStatus {
    /// Statuses that may follow `self`. No transition guard exists for
    /// bookings, so every status may follow every other.
    pub fn next_statuses(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Pending => &[Pending, Confirmed, Cancelled, Completed],
            Confirmed => &[Pending, Confirmed, Cancelled, Completed],
            Cancelled => &[Pending, Confirmed, Cancelled, Completed],
            Completed => &[Pending, Confirmed, Cancelled, Completed],
        }
    }

    pub fn can_become(self, next: BookingStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Bookings in these statuses hold their dates on the listing
    pub fn holds_dates(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl PaymentStatus {
    pub fn next_statuses(self) -> &'static [PaymentStatus] {
        use PaymentStatus::*;
        match self {
            Pending => &[Pending, Paid, Refunded],
            Paid => &[Pending, Paid, Refunded],
            Refunded => &[Pending, Paid, Refunded],
        }
    }

    pub fn can_become(self, next: PaymentStatus) -> bool {
        self.next_statuses().contains(&next)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub listing_id: Uuid,
    pub traveler_id: Uuid,
    pub partner_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub guests: i32,
    pub total_price: f64,
    pub currency: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::listing::Entity",
        from = "Column::ListingId",
        to = "super::listing::Column::Id"
    )]
    Listing,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TravelerId",
        to = "super::user::Column::Id"
    )]
    Traveler,
}

impl Related<super::listing::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Listing.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Traveler.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_transitions_are_unguarded() {
        use BookingStatus::*;
        let all = [Pending, Confirmed, Cancelled, Completed];
        for from in all {
            for to in all {
                assert!(from.can_become(to), "{:?} -> {:?}", from, to);
            }
        }
        let all = [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Refunded];
        for from in all {
            for to in all {
                assert!(from.can_become(to), "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn test_holds_dates() {
        assert!(BookingStatus::Pending.holds_dates());
        assert!(BookingStatus::Confirmed.holds_dates());
        assert!(!BookingStatus::Cancelled.holds_dates());
        assert!(!BookingStatus::Completed.holds_dates());
    }
}
