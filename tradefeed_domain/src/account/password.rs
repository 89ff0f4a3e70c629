use crate::error::{FeedError, FeedResult};

use anyhow::Context;
use argon2::password_hash::{PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use entrait::entrait_export as entrait;

pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;

/// Warning: This should not implement Debug in production
#[derive(Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CleartextPassword(pub String);

impl CleartextPassword {
    pub fn validate(&self) -> FeedResult<()> {
        if (PASSWORD_MIN..=PASSWORD_MAX).contains(&self.0.chars().count()) {
            Ok(())
        } else {
            Err(FeedError::validation(format!(
                "password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
            )))
        }
    }
}

impl<S: Into<String>> From<S> for CleartextPassword {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PasswordHash(pub String);

impl<S: Into<String>> From<S> for PasswordHash {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[entrait(pub HashPassword, no_deps, mock_api=HashPasswordMock)]
async fn hash_password(password: CleartextPassword) -> FeedResult<PasswordHash> {
    // Argon2 is deliberately slow, keep it off the async workers.
    tokio::task::spawn_blocking(move || -> FeedResult<PasswordHash> {
        let salt = SaltString::generate(rand::thread_rng());
        Ok(Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("failed to generate password hash: {}", e))?
            .to_string()
            .into())
    })
    .await
    .context("panic when generating password hash")?
}

#[entrait(pub VerifyPassword, no_deps, mock_api=VerifyPasswordMock)]
async fn verify_password(password: CleartextPassword, password_hash: PasswordHash) -> FeedResult<()> {
    tokio::task::spawn_blocking(move || -> FeedResult<()> {
        let hash = argon2::PasswordHash::new(&password_hash.0)
            .map_err(|e| anyhow::anyhow!("invalid password hash: {}", e))?;

        Argon2::default()
            .verify_password(password.0.as_bytes(), &hash)
            .map_err(|e| match e {
                argon2::password_hash::Error::Password => FeedError::Unauthorized,
                _ => anyhow::anyhow!("failed to verify password hash: {}", e).into(),
            })
    })
    .await
    .context("panic when verifying password hash")??;

    Ok(())
}
