use crate::config::Config;

use tradefeed_db::account::PgAccountRepo;
use tradefeed_db::comment::PgCommentRepo;
use tradefeed_db::follow::PgFollowRepo;
use tradefeed_db::post::PgPostRepo;
use tradefeed_db::{Db, GetDb};
use tradefeed_domain::account::repo::DelegateAccountRepo;
use tradefeed_domain::comment::repo::DelegateCommentRepo;
use tradefeed_domain::follow::repo::DelegateFollowRepo;
use tradefeed_domain::post::repo::DelegatePostRepo;
use tradefeed_domain::{FeedSettings, GetConfig, System};

use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub db: Db,
}

impl System for App {
    fn get_current_time(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

impl GetConfig for App {
    fn get_jwt_signing_key(&self) -> &hmac::Hmac<sha2::Sha384> {
        &self.config.jwt_signing_key.0
    }

    fn get_feed_settings(&self) -> FeedSettings {
        self.config.feed_settings()
    }
}

impl GetDb for App {
    fn get_db(&self) -> &Db {
        &self.db
    }
}

impl DelegateAccountRepo<Self> for App {
    type Target = PgAccountRepo;
}

impl DelegatePostRepo<Self> for App {
    type Target = PgPostRepo;
}

impl DelegateFollowRepo<Self> for App {
    type Target = PgFollowRepo;
}

impl DelegateCommentRepo<Self> for App {
    type Target = PgCommentRepo;
}
