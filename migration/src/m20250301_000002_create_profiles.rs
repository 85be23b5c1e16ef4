use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PartnerProfile::Table)
                    .if_not_exists()
                    .col(uuid(PartnerProfile::UserId).primary_key())
                    .col(string_len(PartnerProfile::BusinessName, 200).not_null())
                    .col(string_len(PartnerProfile::Address, 500).not_null())
                    .col(string_len(PartnerProfile::Phone, 50).not_null())
                    .col(text(PartnerProfile::Description).not_null())
                    .col(string_len(PartnerProfile::Category, 50).not_null())
                    .col(string_len_null(PartnerProfile::Website, 255))
                    .col(string_len(PartnerProfile::Status, 16).not_null())
                    .col(text_null(PartnerProfile::RejectionReason))
                    .col(timestamp_with_time_zone_null(PartnerProfile::ApprovedAt))
                    .col(uuid_null(PartnerProfile::ApprovedBy))
                    .col(timestamp_with_time_zone(PartnerProfile::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(PartnerProfile::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_partner_profile_user")
                            .from(PartnerProfile::Table, PartnerProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_partner_profile_status")
                    .table(PartnerProfile::Table)
                    .col(PartnerProfile::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TravelerProfile::Table)
                    .if_not_exists()
                    .col(uuid(TravelerProfile::UserId).primary_key())
                    .col(string_len(TravelerProfile::DisplayName, 100).not_null())
                    .col(json(TravelerProfile::Interests).not_null())
                    .col(json(TravelerProfile::PreferredLocations).not_null())
                    .col(double(TravelerProfile::BudgetMin).not_null())
                    .col(double(TravelerProfile::BudgetMax).not_null())
                    .col(string_len(TravelerProfile::TravelType, 50).not_null())
                    .col(timestamp_with_time_zone(TravelerProfile::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(TravelerProfile::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_traveler_profile_user")
                            .from(TravelerProfile::Table, TravelerProfile::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TravelerProfile::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(PartnerProfile::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PartnerProfile {
    Table,
    UserId,
    BusinessName,
    Address,
    Phone,
    Description,
    Category,
    Website,
    Status,
    RejectionReason,
    ApprovedAt,
    ApprovedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum TravelerProfile {
    Table,
    UserId,
    DisplayName,
    Interests,
    PreferredLocations,
    BudgetMin,
    BudgetMax,
    TravelType,
    CreatedAt,
    UpdatedAt,
}
