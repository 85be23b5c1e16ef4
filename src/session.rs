//! Top-level view selection for client sessions.
//!
//! The view is never stored: it is re-derived from a [`SessionSnapshot`]
//! every time anything in the session changes, so an inconsistent
//! intermediate state heals on the next evaluation.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::entities::user::UserRole;

/// Shortest re-check interval `spawn_view_router` will tick at
pub const MIN_RECHECK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Persisted on the device, set once the user finishes onboarding
    pub onboarding_complete: bool,
    pub identity: Option<Identity>,
    /// Whether the role-appropriate profile record exists
    pub has_profile: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Onboarding,
    Auth,
    EmailVerification,
    TravelerProfileCreation,
    PartnerProfileCreation,
    TravelerHome,
    PartnerHome,
    AdminHome,
}

/// Evaluate the precedence chain. First matching rule wins.
pub fn resolve_view(session: &SessionSnapshot) -> View {
    if !session.onboarding_complete {
        return View::Onboarding;
    }

    let Some(identity) = &session.identity else {
        return View::Auth;
    };

    if !identity.email_verified {
        return View::EmailVerification;
    }

    match (identity.role, session.has_profile) {
        (UserRole::Admin, _) => View::AdminHome,
        (UserRole::Traveler, false) => View::TravelerProfileCreation,
        (UserRole::Partner, false) => View::PartnerProfileCreation,
        (UserRole::Traveler, true) => View::TravelerHome,
        (UserRole::Partner, true) => View::PartnerHome,
    }
}

/// Explicit session state shared with whatever needs it.
///
/// Created at app start; [`SessionContext::sign_out`] tears down the signed-in
/// part, dropping the context ends every subscription.
pub struct SessionContext {
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionContext {
    pub fn start(onboarding_complete: bool) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot {
            onboarding_complete,
            ..Default::default()
        });
        Self { tx }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn complete_onboarding(&self) {
        self.tx.send_modify(|s| s.onboarding_complete = true);
    }

    pub fn signed_in(&self, identity: Identity, has_profile: bool) {
        tracing::debug!(user_id = %identity.user_id, role = ?identity.role, "Session signed in");
        self.tx.send_modify(|s| {
            s.identity = Some(identity);
            s.has_profile = has_profile;
        });
    }

    /// Called after the identity was reloaded and reports a verified email
    pub fn email_verified(&self) {
        self.tx.send_modify(|s| {
            if let Some(identity) = s.identity.as_mut() {
                identity.email_verified = true;
            }
        });
    }

    pub fn profile_loaded(&self, exists: bool) {
        self.tx.send_modify(|s| s.has_profile = exists);
    }

    pub fn sign_out(&self) {
        tracing::debug!("Session signed out");
        self.tx.send_modify(|s| {
            s.identity = None;
            s.has_profile = false;
        });
    }
}

/// Re-derive the view whenever the session publishes a change.
///
/// `recheck` is a coarse fallback tick for state changes that are not
/// published through the context, raised to [`MIN_RECHECK`] when shorter.
/// The task ends when the context is dropped.
pub fn spawn_view_router(
    mut session: watch::Receiver<SessionSnapshot>,
    recheck: Duration,
) -> (watch::Receiver<View>, JoinHandle<()>) {
    let initial = resolve_view(&session.borrow_and_update());
    let (view_tx, view_rx) = watch::channel(initial);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(recheck.max(MIN_RECHECK));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = session.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {}
            }

            let view = resolve_view(&session.borrow_and_update());
            view_tx.send_if_modified(|current| {
                if *current == view {
                    return false;
                }
                tracing::debug!(from = ?*current, to = ?view, "View changed");
                *current = view;
                true
            });
        }
    });

    (view_rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: UserRole, verified: bool) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
            email_verified: verified,
        }
    }

    #[test]
    fn test_onboarding_wins_over_everything() {
        let session = SessionSnapshot {
            onboarding_complete: false,
            identity: Some(identity(UserRole::Admin, true)),
            has_profile: true,
        };
        assert_eq!(resolve_view(&session), View::Onboarding);

        let session = SessionSnapshot::default();
        assert_eq!(resolve_view(&session), View::Onboarding);
    }

    #[test]
    fn test_chain_order() {
        let mut session = SessionSnapshot {
            onboarding_complete: true,
            ..Default::default()
        };
        assert_eq!(resolve_view(&session), View::Auth);

        session.identity = Some(identity(UserRole::Traveler, false));
        session.has_profile = true;
        assert_eq!(resolve_view(&session), View::EmailVerification);

        session.identity = Some(identity(UserRole::Traveler, true));
        session.has_profile = false;
        assert_eq!(resolve_view(&session), View::TravelerProfileCreation);

        session.has_profile = true;
        assert_eq!(resolve_view(&session), View::TravelerHome);

        session.identity = Some(identity(UserRole::Partner, true));
        session.has_profile = false;
        assert_eq!(resolve_view(&session), View::PartnerProfileCreation);
    }

    #[test]
    fn test_admin_skips_profile_creation() {
        let session = SessionSnapshot {
            onboarding_complete: true,
            identity: Some(identity(UserRole::Admin, true)),
            has_profile: false,
        };
        assert_eq!(resolve_view(&session), View::AdminHome);
    }

    #[test]
    fn test_context_sign_out_clears_identity() {
        let ctx = SessionContext::start(true);
        ctx.signed_in(identity(UserRole::Partner, true), true);
        assert_eq!(resolve_view(&ctx.snapshot()), View::PartnerHome);

        ctx.sign_out();
        assert_eq!(resolve_view(&ctx.snapshot()), View::Auth);
    }

    #[tokio::test]
    async fn test_router_with_zero_recheck_still_runs() {
        let ctx = SessionContext::start(false);
        let (mut views, handle) = spawn_view_router(ctx.subscribe(), Duration::ZERO);

        ctx.complete_onboarding();
        tokio::time::timeout(Duration::from_secs(5), views.changed())
            .await
            .expect("router did not react")
            .unwrap();
        assert_eq!(*views.borrow_and_update(), View::Auth);

        drop(ctx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("router did not stop")
            .expect("router task panicked");
    }

    #[tokio::test]
    async fn test_router_follows_session_changes() {
        let ctx = SessionContext::start(false);
        let (mut views, handle) = spawn_view_router(ctx.subscribe(), Duration::from_secs(3600));
        assert_eq!(*views.borrow(), View::Onboarding);

        ctx.complete_onboarding();
        tokio::time::timeout(Duration::from_secs(5), views.changed())
            .await
            .expect("router did not react")
            .unwrap();
        assert_eq!(*views.borrow_and_update(), View::Auth);

        ctx.signed_in(identity(UserRole::Traveler, false), false);
        tokio::time::timeout(Duration::from_secs(5), views.changed())
            .await
            .expect("router did not react")
            .unwrap();
        assert_eq!(*views.borrow_and_update(), View::EmailVerification);

        ctx.email_verified();
        tokio::time::timeout(Duration::from_secs(5), views.changed())
            .await
            .expect("router did not react")
            .unwrap();
        assert_eq!(*views.borrow_and_update(), View::TravelerProfileCreation);

        drop(ctx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("router did not stop")
            .unwrap();
    }
}
