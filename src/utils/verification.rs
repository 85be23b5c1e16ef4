use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};

const TOKEN_LEN: usize = 48;

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Serialize)]
struct VerificationMail<'a> {
    to: &'a str,
    kind: &'static str,
    token: &'a str,
}

/// Hand the verification token to the mail collaborator.
///
/// Without a configured webhook the token is only logged at debug, which is what
/// local development relies on.
pub async fn send_verification_email(config: &Config, email: &str, token: &str) -> AppResult<()> {
    let Some(url) = config.mail_webhook_url.as_deref() else {
        tracing::info!(email = %email, "No mail webhook configured, verification email not sent");
        tracing::debug!(email = %email, token = %token, "Verification token");
        return Ok(());
    };

    let response = reqwest::Client::new()
        .post(url)
        .json(&VerificationMail {
            to: email,
            kind: "verify_email",
            token,
        })
        .send()
        .await
        .map_err(|e| AppError::Collaborator(format!("Mail webhook unreachable: {}", e)))?;

    if !response.status().is_success() {
        return Err(AppError::Collaborator(format!(
            "Mail webhook responded with {}",
            response.status()
        )));
    }

    tracing::debug!(email = %email, "Verification email dispatched");
    Ok(())
}
