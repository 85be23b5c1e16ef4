use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::StringList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ListingCategory {
    #[sea_orm(string_value = "tour")]
    Tour,
    #[sea_orm(string_value = "accommodation")]
    Accommodation,
    #[sea_orm(string_value = "transport")]
    Transport,
    #[sea_orm(string_value = "activity")]
    Activity,
}

impl std::str::FromStr for ListingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tour" => Ok(ListingCategory::Tour),
            "accommodation" => Ok(ListingCategory::Accommodation),
            "transport" => Ok(ListingCategory::Transport),
            "activity" => Ok(ListingCategory::Activity),
            other => Err(format!(
                "Unknown category '{}', expected tour, accommodation, transport or activity",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "listing")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub partner_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: ListingCategory,
    pub location: String,
    pub price: f64,
    pub currency: String,
    pub start_date: Date,
    pub end_date: Date,
    #[sea_orm(column_type = "Json")]
    pub images: StringList,
    #[sea_orm(column_type = "Json")]
    pub tags: StringList,
    pub status: ListingStatus,
    pub is_active: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::partner_profile::Entity",
        from = "Column::PartnerId",
        to = "super::partner_profile::Column::UserId"
    )]
    Partner,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::favorite::Entity")]
    Favorites,
}

impl Related<super::partner_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partner.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::favorite::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
