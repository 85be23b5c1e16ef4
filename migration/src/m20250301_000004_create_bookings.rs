use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;
use super::m20250301_000003_create_listings::Listing;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::ListingId).not_null())
                    .col(uuid(Booking::TravelerId).not_null())
                    .col(uuid(Booking::PartnerId).not_null())
                    .col(date(Booking::StartDate).not_null())
                    .col(date(Booking::EndDate).not_null())
                    .col(integer(Booking::Guests).not_null())
                    .col(double(Booking::TotalPrice).not_null())
                    .col(string_len(Booking::Currency, 3).not_null())
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(string_len(Booking::PaymentStatus, 16).not_null())
                    .col(timestamp_with_time_zone(Booking::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Booking::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_listing")
                            .from(Booking::Table, Booking::ListingId)
                            .to(Listing::Table, Listing::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_traveler")
                            .from(Booking::Table, Booking::TravelerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    ListingId,
    TravelerId,
    PartnerId,
    StartDate,
    EndDate,
    Guests,
    TotalPrice,
    Currency,
    Status,
    PaymentStatus,
    CreatedAt,
    UpdatedAt,
}
