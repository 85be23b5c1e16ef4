use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000002_create_profiles::PartnerProfile;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Listing::Table)
                    .if_not_exists()
                    .col(uuid(Listing::Id).primary_key())
                    .col(uuid(Listing::PartnerId).not_null())
                    .col(string_len(Listing::Title, 200).not_null())
                    .col(text(Listing::Description).not_null())
                    .col(string_len(Listing::Category, 16).not_null())
                    .col(string_len(Listing::Location, 255).not_null())
                    .col(double(Listing::Price).not_null())
                    .col(string_len(Listing::Currency, 3).not_null())
                    .col(date(Listing::StartDate).not_null())
                    .col(date(Listing::EndDate).not_null())
                    .col(json(Listing::Images).not_null())
                    .col(json(Listing::Tags).not_null())
                    .col(string_len(Listing::Status, 16).not_null())
                    .col(boolean(Listing::IsActive).not_null().default(true))
                    .col(text_null(Listing::RejectionReason))
                    .col(timestamp_with_time_zone_null(Listing::ReviewedAt))
                    .col(uuid_null(Listing::ReviewedBy))
                    .col(timestamp_with_time_zone(Listing::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Listing::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_listing_partner")
                            .from(Listing::Table, Listing::PartnerId)
                            .to(PartnerProfile::Table, PartnerProfile::UserId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Traveler queries always filter on status first, then order by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_listing_status_created_at")
                    .table(Listing::Table)
                    .col(Listing::Status)
                    .col(Listing::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Listing::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Listing {
    Table,
    Id,
    PartnerId,
    Title,
    Description,
    Category,
    Location,
    Price,
    Currency,
    StartDate,
    EndDate,
    Images,
    Tags,
    Status,
    IsActive,
    RejectionReason,
    ReviewedAt,
    ReviewedBy,
    CreatedAt,
    UpdatedAt,
}
