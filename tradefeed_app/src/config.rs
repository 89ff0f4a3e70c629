use std::net::SocketAddr;
use std::time::Duration;

use tradefeed_domain::FeedSettings;

#[derive(clap::Parser)]
pub struct Config {
    #[arg(long, env)]
    pub database_url: String,

    #[arg(long, env)]
    pub jwt_signing_key: JwtSigningKey,

    #[arg(long, env, default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    #[arg(long, env, default_value_t = 50)]
    pub db_max_connections: u32,

    /// Longest wait for a pooled connection before the request fails as transient.
    #[arg(long, env, default_value_t = 5)]
    pub db_acquire_timeout_secs: u64,

    /// Server-side limit for a single SQL statement.
    #[arg(long, env, default_value_t = 15)]
    pub db_statement_timeout_secs: u64,

    /// Requests still running after this many seconds are answered with a transient error.
    #[arg(long, env, default_value_t = 30)]
    pub request_timeout_secs: u64,

    #[arg(long, env, default_value_t = 20)]
    pub default_page_size: i64,

    #[arg(long, env, default_value_t = 100)]
    pub max_page_size: i64,

    /// Collapse repeated hashtags found in a post body.
    #[arg(long, env, default_value_t = false, action = clap::ArgAction::Set)]
    pub dedup_hashtags: bool,
}

impl Config {
    pub fn db_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    pub fn db_statement_timeout(&self) -> Duration {
        Duration::from_secs(self.db_statement_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            dedup_hashtags: self.dedup_hashtags,
        }
    }

    /// Reject page sizes that would make every default listing invalid, and
    /// timeouts that could never fire.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_page_size < 1 || self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "DEFAULT_PAGE_SIZE must be between 1 and MAX_PAGE_SIZE ({})",
                self.max_page_size
            );
        }
        if self.db_statement_timeout_secs == 0 || self.request_timeout_secs == 0 {
            anyhow::bail!("DB_STATEMENT_TIMEOUT_SECS and REQUEST_TIMEOUT_SECS must be positive");
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct JwtSigningKey(pub hmac::Hmac<sha2::Sha384>);

impl std::str::FromStr for JwtSigningKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use hmac::Mac;

        Ok(Self(
            hmac::Hmac::<sha2::Sha384>::new_from_slice(s.as_bytes())
                .map_err(|e| format!("Failed to parse hmac: {e:?}"))?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "tradefeed",
            "--database-url",
            "postgres://localhost/tradefeed",
            "--jwt-signing-key",
            "s3cr3t",
            "--listen-addr",
            "127.0.0.1:3000",
            "--max-page-size",
            "50",
            "--default-page-size",
            "10",
            "--dedup-hashtags",
            "true",
        ])
        .unwrap();

        assert_eq!("127.0.0.1:3000", config.listen_addr.to_string());
        assert_eq!(
            FeedSettings {
                default_page_size: 10,
                max_page_size: 50,
                dedup_hashtags: true,
            },
            config.feed_settings()
        );
        assert!(config.validate().is_ok());
        assert_eq!(Duration::from_secs(15), config.db_statement_timeout());
        assert_eq!(Duration::from_secs(30), config.request_timeout());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = Config::try_parse_from([
            "tradefeed",
            "--database-url",
            "postgres://localhost/tradefeed",
            "--jwt-signing-key",
            "s3cr3t",
            "--request-timeout-secs",
            "0",
        ])
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn default_page_size_must_fit_the_maximum() {
        let config = Config::try_parse_from([
            "tradefeed",
            "--database-url",
            "postgres://localhost/tradefeed",
            "--jwt-signing-key",
            "s3cr3t",
            "--default-page-size",
            "500",
            "--max-page-size",
            "100",
        ])
        .unwrap();

        assert!(config.validate().is_err());
    }
}
