use crate::error::{FeedError, FeedResult};

use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

const HANDLE_MAX: usize = 30;
static HANDLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9.\-_]*[A-Za-z0-9]$").expect("compile handle regex")
});

const EMAIL_MAX: usize = 254;
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
        .expect("compile email regex")
});

/// Checks the public `@handle` of an account.
pub fn validate_handle(handle: &str) -> FeedResult<()> {
    if handle.len() <= HANDLE_MAX && HANDLE_REGEX.is_match(handle) {
        Ok(())
    } else {
        Err(FeedError::validation(format!("invalid handle: {handle:?}")))
    }
}

#[derive(Clone, Eq, PartialEq, serde::Serialize, serde::Deserialize, Debug)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Wrap an email that was already validated, e.g. one read back from the store.
    pub fn valid(email: String) -> Self {
        Self(email)
    }
}

impl FromStr for Email {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() <= EMAIL_MAX && EMAIL_REGEX.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(FeedError::validation(format!("invalid email: {s:?}")))
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
