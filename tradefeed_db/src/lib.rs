use tradefeed_domain::account::repo::DelegateAccountRepo;
use tradefeed_domain::comment::repo::DelegateCommentRepo;
use tradefeed_domain::error::{FeedError, FeedResult};
use tradefeed_domain::follow::repo::DelegateFollowRepo;
use tradefeed_domain::post::repo::DelegatePostRepo;

use anyhow::Context;
use sqlx::postgres::PgConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

pub mod account;
pub mod comment;
pub mod follow;
pub mod post;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

#[derive(Clone)]
pub struct Db {
    pub pg_pool: PgPool,
}

impl Db {
    /// Statements running longer than `statement_timeout` are cancelled by
    /// the server and surface as [FeedError::Unavailable].
    pub async fn init(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
        statement_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let connect_options = PgConnectOptions::from_str(url)
            .context("malformed database_url")?
            .options([(
                "statement_timeout",
                format!("{}ms", statement_timeout.as_millis()),
            )]);

        let pg_pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(connect_options)
            .await
            .context("could not connect to database_url")?;

        sqlx::migrate!("../migrations")
            .run(&pg_pool)
            .await
            .context("failed to run migrations")?;

        tracing::info!(max_connections, "connected to database");

        Ok(Db { pg_pool })
    }
}

pub trait GetDb {
    fn get_db(&self) -> &Db;
}

impl GetDb for Db {
    fn get_db(&self) -> &Db {
        self
    }
}

impl<T: GetDb> GetDb for entrait::Impl<T> {
    fn get_db(&self) -> &Db {
        (**self).get_db()
    }
}

// `Db` on its own is a complete repository stack.
impl DelegateAccountRepo<Self> for Db {
    type Target = account::PgAccountRepo;
}

impl DelegatePostRepo<Self> for Db {
    type Target = post::PgPostRepo;
}

impl DelegateFollowRepo<Self> for Db {
    type Target = follow::PgFollowRepo;
}

impl DelegateCommentRepo<Self> for Db {
    type Target = comment::PgCommentRepo;
}

/// Errors that can be turned into a [FeedError] at the store boundary.
pub trait IntoFeedError {
    fn into_feed_error(self) -> FeedError;
}

impl IntoFeedError for FeedError {
    fn into_feed_error(self) -> FeedError {
        self
    }
}

impl IntoFeedError for sqlx::Error {
    fn into_feed_error(self) -> FeedError {
        let transient = match &self {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => true,
            sqlx::Error::Database(dbe) => is_transient_sqlstate(dbe.code().as_deref()),
            _ => false,
        };
        let malformed = matches!(
            self,
            sqlx::Error::ColumnDecode { .. }
                | sqlx::Error::Decode(_)
                | sqlx::Error::ColumnNotFound(_)
                | sqlx::Error::ColumnIndexOutOfBounds { .. }
                | sqlx::Error::TypeNotFound { .. }
                | sqlx::Error::Protocol(_)
                | sqlx::Error::RowNotFound
        );

        if transient {
            FeedError::Unavailable(self.into())
        } else if malformed {
            FeedError::DataIntegrity(self.to_string())
        } else {
            FeedError::Anyhow(self.into())
        }
    }
}

/// Connection exceptions (08), insufficient resources (53), operator
/// intervention such as shutdown (57P) and cancelled statements (57014),
/// which is how an exceeded `statement_timeout` is reported.
fn is_transient_sqlstate(code: Option<&str>) -> bool {
    const QUERY_CANCELED: &str = "57014";

    matches!(
        code,
        Some(code) if code.starts_with("08")
            || code.starts_with("53")
            || code.starts_with("57P")
            || code == QUERY_CANCELED
    )
}

pub(crate) trait DbResultExt<T> {
    fn to_feed_err(self) -> FeedResult<T>;

    /// Replace the violation of the named constraint with a domain error.
    fn on_constraint(self, name: &str, map_err: impl FnOnce() -> FeedError) -> FeedResult<T>;
}

impl<T, E: IntoFeedError> DbResultExt<T> for Result<T, E> {
    fn to_feed_err(self) -> FeedResult<T> {
        self.map_err(IntoFeedError::into_feed_error)
    }

    fn on_constraint(self, name: &str, map_err: impl FnOnce() -> FeedError) -> FeedResult<T> {
        self.map_err(|e| {
            let e = e.into_feed_error();
            if violated_constraint(&e) == Some(name) {
                map_err()
            } else {
                e
            }
        })
    }
}

fn violated_constraint(error: &FeedError) -> Option<&str> {
    match error {
        FeedError::Anyhow(e) => match e.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::Database(dbe)) => dbe.constraint(),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
async fn create_test_db() -> entrait::Impl<Db> {
    use sha2::Digest;
    use sqlx::Connection;

    let mut hasher = sha2::Sha256::new();
    hasher.update(std::thread::current().name().unwrap().as_bytes());
    let thread_hash = hex::encode(hasher.finalize());
    let db_name = &thread_hash[0..24];

    let mut url = database_server_url();
    let mut connection = sqlx::PgConnection::connect(url.as_str()).await.unwrap();

    sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{}""#, db_name))
        .execute(&mut connection)
        .await
        .expect("failed to drop");

    sqlx::query(&format!(r#"CREATE DATABASE "{}""#, db_name))
        .execute(&mut connection)
        .await
        .expect("failed creating test database");

    url.set_path(db_name);

    let pg_pool = sqlx::PgPool::connect(url.as_str())
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("../migrations")
        .run(&pg_pool)
        .await
        .expect("Failed to migrate");

    entrait::Impl::new(Db { pg_pool })
}

#[cfg(test)]
fn database_server_url() -> url::Url {
    // (re)load the .env file
    dotenv::dotenv().ok();

    let mut url: url::Url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set")
        .parse()
        .expect("malformed DATABASE_URL");

    if let Ok(mut path) = url.path_segments_mut() {
        path.clear();
    }

    url
}
