mod common;

use skyconnect_backend::entities::user::UserRole;
use skyconnect_backend::repo::travelers::{self, TravelerProfileInput};
use skyconnect_backend::repo::users::{self, Registration};
use skyconnect_backend::session::{resolve_view, View};
use skyconnect_backend::utils::jwt::{create_token, verify_token};
use skyconnect_backend::AppError;

use common::*;

fn claims_for(user: &skyconnect_backend::entities::user::Model) -> skyconnect_backend::utils::jwt::Claims {
    let token = create_token(user.id, &user.email, user.role, "test-secret", 1).unwrap();
    verify_token(&token, "test-secret").unwrap()
}

fn traveler_profile_input() -> TravelerProfileInput {
    TravelerProfileInput {
        display_name: "Ana".to_string(),
        interests: vec!["hiking".to_string(), " ".to_string()],
        preferred_locations: vec!["Split".to_string()],
        budget_min: 50.0,
        budget_max: 300.0,
        travel_type: "solo".to_string(),
    }
}

#[tokio::test]
async fn test_unfinished_onboarding_wins_for_anyone() {
    let db = setup_db().await;

    let snapshot = users::session_snapshot(&db, None, false).await.unwrap();
    assert_eq!(resolve_view(&snapshot), View::Onboarding);

    let admin = create_user(&db, UserRole::Admin, true).await;
    let claims = claims_for(&admin);
    let snapshot = users::session_snapshot(&db, Some(&claims), false).await.unwrap();
    assert_eq!(resolve_view(&snapshot), View::Onboarding);

    let snapshot = users::session_snapshot(&db, None, true).await.unwrap();
    assert_eq!(resolve_view(&snapshot), View::Auth);
}

#[tokio::test]
async fn test_verified_traveler_without_profile_creates_one_first() {
    let db = setup_db().await;
    let traveler = create_user(&db, UserRole::Traveler, true).await;
    let claims = claims_for(&traveler);

    let snapshot = users::session_snapshot(&db, Some(&claims), true).await.unwrap();
    assert!(!snapshot.has_profile);
    assert_eq!(resolve_view(&snapshot), View::TravelerProfileCreation);

    let profile = travelers::create(&db, traveler.id, traveler_profile_input()).await.unwrap();
    assert_eq!(profile.interests.0, vec!["hiking".to_string()]);

    let snapshot = users::session_snapshot(&db, Some(&claims), true).await.unwrap();
    assert_eq!(resolve_view(&snapshot), View::TravelerHome);
}

#[tokio::test]
async fn test_partner_views_and_admin_home() {
    let db = setup_db().await;

    let unverified = create_user(&db, UserRole::Partner, false).await;
    let snapshot = users::session_snapshot(&db, Some(&claims_for(&unverified)), true)
        .await
        .unwrap();
    assert_eq!(resolve_view(&snapshot), View::EmailVerification);

    let partner = create_user(&db, UserRole::Partner, true).await;
    let claims = claims_for(&partner);
    let snapshot = users::session_snapshot(&db, Some(&claims), true).await.unwrap();
    assert_eq!(resolve_view(&snapshot), View::PartnerProfileCreation);

    skyconnect_backend::repo::partners::submit(&db, partner.id, partner_submission("Blue Cave Trips"))
        .await
        .unwrap();
    let snapshot = users::session_snapshot(&db, Some(&claims), true).await.unwrap();
    assert_eq!(resolve_view(&snapshot), View::PartnerHome);

    let admin = create_user(&db, UserRole::Admin, true).await;
    let snapshot = users::session_snapshot(&db, Some(&claims_for(&admin)), true)
        .await
        .unwrap();
    assert_eq!(resolve_view(&snapshot), View::AdminHome);
}

#[tokio::test]
async fn test_registration_and_email_verification() {
    let db = setup_db().await;

    let (user, token) = users::register(
        &db,
        Registration {
            email: " Ana@Example.com ".to_string(),
            password: "correct horse".to_string(),
            name: "Ana".to_string(),
            role: UserRole::Traveler,
        },
    )
    .await
    .unwrap();
    assert_eq!(user.email, "ana@example.com");
    assert!(!user.email_verified);

    let snapshot = users::session_snapshot(&db, Some(&claims_for(&user)), true)
        .await
        .unwrap();
    assert_eq!(resolve_view(&snapshot), View::EmailVerification);

    // Profiles wait for verification
    assert!(matches!(
        travelers::create(&db, user.id, traveler_profile_input()).await,
        Err(AppError::Forbidden(_))
    ));

    let verified = users::verify_email(&db, &token).await.unwrap();
    assert!(verified.email_verified);
    assert!(matches!(
        users::verify_email(&db, &token).await,
        Err(AppError::NotFound(_))
    ));

    let snapshot = users::session_snapshot(&db, Some(&claims_for(&verified)), true)
        .await
        .unwrap();
    assert_eq!(resolve_view(&snapshot), View::TravelerProfileCreation);

    let logged_in = users::authenticate(&db, "ana@example.com", "correct horse").await.unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(matches!(
        users::authenticate(&db, "ana@example.com", "wrong password").await,
        Err(AppError::Unauthorized(_))
    ));

    let duplicate = users::register(
        &db,
        Registration {
            email: "ana@example.com".to_string(),
            password: "another password".to_string(),
            name: "Ana again".to_string(),
            role: UserRole::Partner,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let admin = users::register(
        &db,
        Registration {
            email: "root@example.com".to_string(),
            password: "long enough".to_string(),
            name: "Root".to_string(),
            role: UserRole::Admin,
        },
    )
    .await;
    assert!(matches!(admin, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_traveler_budget_must_be_ordered() {
    let db = setup_db().await;
    let traveler = create_user(&db, UserRole::Traveler, true).await;

    let mut input = traveler_profile_input();
    input.budget_min = 500.0;
    assert!(matches!(
        travelers::create(&db, traveler.id, input).await,
        Err(AppError::Validation(_))
    ));
}
