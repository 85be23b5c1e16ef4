#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

use skyconnect_backend::approval::{ListingSubmission, PartnerSubmission};
use skyconnect_backend::db::{self, server_timestamp};
use skyconnect_backend::entities::listing;
use skyconnect_backend::entities::user::{self, UserRole};
use skyconnect_backend::repo::{listings, partners};
use skyconnect_backend::Config;

/// Fresh in-memory database with the real migrations applied
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // One connection, otherwise every pooled connection gets its own database
    opts.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opts).await.expect("sqlite connects");
    db::migrate(&db).await.expect("migrations run");
    db
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        admin_email: "admin@skyconnect.test".to_string(),
        admin_password: "admin-password".to_string(),
        mail_webhook_url: None,
        rate_limit_enabled: false,
    }
}

/// Insert a user directly, skipping password hashing
pub async fn create_user(db: &DatabaseConnection, role: UserRole, verified: bool) -> user::Model {
    let id = Uuid::new_v4();
    let now = server_timestamp();
    user::ActiveModel {
        id: Set(id),
        email: Set(format!("{}@skyconnect.test", id.simple())),
        password_hash: Set("not-a-real-hash".to_string()),
        name: Set(format!("{:?} user", role)),
        role: Set(role),
        email_verified: Set(verified),
        verification_token: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("user inserted")
}

pub fn partner_submission(name: &str) -> PartnerSubmission {
    PartnerSubmission {
        business_name: name.to_string(),
        address: "Riva 1, Split".to_string(),
        phone: "+385 21 000 000".to_string(),
        description: "Local tours and transfers".to_string(),
        category: "tours".to_string(),
        website: None,
        status: None,
    }
}

/// Verified partner account with a pending profile
pub async fn pending_partner(db: &DatabaseConnection) -> Uuid {
    let user = create_user(db, UserRole::Partner, true).await;
    partners::submit(db, user.id, partner_submission("Adriatic Tours"))
        .await
        .expect("partner submitted");
    user.id
}

pub async fn approved_partner(db: &DatabaseConnection, admin_id: Uuid) -> Uuid {
    let partner_id = pending_partner(db).await;
    partners::approve(db, partner_id, admin_id)
        .await
        .expect("partner approved");
    partner_id
}

pub fn listing_submission(title: &str, category: &str, price: f64, tags: &[&str]) -> ListingSubmission {
    ListingSubmission {
        title: title.to_string(),
        description: format!("{} with a local guide", title),
        category: category.to_string(),
        location: "Split, Croatia".to_string(),
        price,
        currency: "EUR".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date"),
        end_date: NaiveDate::from_ymd_opt(2026, 10, 31).expect("valid date"),
        images: vec!["https://cdn.skyconnect.test/1.jpg".to_string()],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        status: None,
    }
}

pub async fn approved_listing(
    db: &DatabaseConnection,
    partner_id: Uuid,
    admin_id: Uuid,
    input: ListingSubmission,
) -> listing::Model {
    let created = submitted_listing(db, partner_id, input).await;
    listings::approve(db, created.id, admin_id)
        .await
        .expect("listing approved")
}

/// Sleeps briefly first so consecutive listings get distinct creation times
pub async fn submitted_listing(
    db: &DatabaseConnection,
    partner_id: Uuid,
    input: ListingSubmission,
) -> listing::Model {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    listings::submit(db, partner_id, input)
        .await
        .expect("listing submitted")
}
