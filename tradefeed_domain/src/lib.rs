pub mod account;
pub mod comment;
pub mod enrich;
pub mod error;
pub mod follow;
pub mod iter_util;
pub mod post;
pub mod profile;

use entrait::entrait_export as entrait;

///
/// Mockable system abstraction
///
#[entrait(mock_api=SystemMock)]
pub trait System {
    fn get_current_time(&self) -> time::OffsetDateTime;
}

///
/// Mockable config accessor
///
#[entrait(mock_api=GetConfigMock)]
pub trait GetConfig {
    fn get_jwt_signing_key(&self) -> &hmac::Hmac<sha2::Sha384>;

    fn get_feed_settings(&self) -> FeedSettings;
}

/// Tunables for post listing and creation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FeedSettings {
    /// Page size used when a listing does not ask for one.
    pub default_page_size: i64,
    /// Largest page a caller may ask for.
    pub max_page_size: i64,
    /// Collapse repeated hashtags extracted from a post body.
    pub dedup_hashtags: bool,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
            dedup_hashtags: false,
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use unimock::*;

    pub fn mock_system_and_config() -> impl unimock::Clause {
        use hmac::Mac;

        (
            SystemMock::get_current_time
                .each_call(matching!())
                .returns(time::OffsetDateTime::from_unix_timestamp(0).unwrap()),
            GetConfigMock::get_jwt_signing_key
                .each_call(matching!())
                .returns(
                    hmac::Hmac::<sha2::Sha384>::new_from_slice("foobar".as_bytes())
                        .expect("HMAC-SHA-384 can accept any key length"),
                ),
        )
    }

    pub fn mock_feed_settings(settings: FeedSettings) -> impl unimock::Clause {
        GetConfigMock::get_feed_settings
            .each_call(matching!())
            .returns(settings)
    }
}
