use super::AccountId;
use crate::error::{FeedError, FeedResult};
use crate::{GetConfig, System};

use axum_extra::TypedHeader;
use entrait::entrait_export as entrait;
use headers::authorization::Credentials;
use headers::Authorization;
use http::HeaderValue;
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use uuid::Uuid;

const DEFAULT_SESSION_LENGTH: time::Duration = time::Duration::weeks(2);

#[derive(serde::Serialize, serde::Deserialize)]
struct AuthClaims {
    account_id: Uuid,
    /// Standard JWT `exp` claim.
    exp: i64,
}

#[entrait(pub SignAccountId, mock_api=SignAccountIdMock)]
fn sign_account_id(deps: &(impl System + GetConfig), account_id: AccountId) -> String {
    AuthClaims {
        account_id: account_id.0,
        exp: (deps.get_current_time() + DEFAULT_SESSION_LENGTH).unix_timestamp(),
    }
    .sign_with_key(deps.get_jwt_signing_key())
    .expect("HMAC signing should be infallible")
}

#[entrait(pub Authenticate, mock_api=AuthenticateMock)]
pub mod authenticate {
    use super::*;

    pub fn authenticate(deps: &(impl System + GetConfig), token: Token) -> FeedResult<AccountId> {
        authenticate_inner(deps, token)
    }

    pub fn opt_authenticate(
        deps: &(impl System + GetConfig),
        token: Option<Token>,
    ) -> FeedResult<Option<AccountId>> {
        token
            .map(|token| authenticate_inner(deps, token))
            .transpose()
    }

    fn authenticate_inner(deps: &(impl System + GetConfig), token: Token) -> FeedResult<AccountId> {
        let jwt = jwt::Token::<jwt::Header, AuthClaims, _>::parse_unverified(token.token())
            .map_err(|_| FeedError::Unauthorized)?;

        let jwt = jwt
            .verify_with_key(deps.get_jwt_signing_key())
            .map_err(|_| FeedError::Unauthorized)?;
        let (_header, claims) = jwt.into();

        if claims.exp < deps.get_current_time().unix_timestamp() {
            return Err(FeedError::Unauthorized);
        }

        Ok(AccountId(claims.account_id))
    }
}

///
/// Data for the `Bearer` authorization scheme.
///
#[derive(Debug)]
pub struct Token(String);

impl Token {
    pub fn none() -> Option<Token> {
        None
    }

    pub fn from_token(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl Credentials for Token {
    const SCHEME: &'static str = "Bearer";

    fn decode(value: &HeaderValue) -> Option<Self> {
        // The scheme prefix has already been checked by `Authorization`.
        let token = value.to_str().ok()?.get(Self::SCHEME.len()..)?.trim();
        if token.is_empty() {
            None
        } else {
            Some(Token(token.to_string()))
        }
    }

    fn encode(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("{} {}", Self::SCHEME, self.0))
            .expect("JWTs only contain header-safe characters")
    }
}

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for Token
where
    S: Send + Sync,
{
    type Rejection = FeedError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(token)) =
            TypedHeader::<Authorization<Token>>::from_request_parts(parts, state)
                .await
                .map_err(|_| FeedError::Unauthorized)?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GetConfigMock, SystemMock};

    use assert_matches::*;
    use unimock::*;

    fn test_account_id() -> AccountId {
        AccountId(uuid::Uuid::parse_str("20a626ba-c7d3-44c7-981a-e880f81c126f").unwrap())
    }

    #[test]
    fn should_sign_and_authenticate_token() {
        let deps = Unimock::new(crate::test::mock_system_and_config());
        let token = sign_account_id(&deps, test_account_id());

        assert_eq!(
            test_account_id(),
            authenticate::authenticate(&deps, Token::from_token(&token)).unwrap()
        );
        assert_eq!(
            Some(test_account_id()),
            authenticate::opt_authenticate(&deps, Some(Token::from_token(&token))).unwrap()
        );
    }

    #[test]
    fn missing_token_is_anonymous() {
        let deps = Unimock::new(());
        assert_matches!(
            authenticate::opt_authenticate(&deps, Token::none()),
            Ok(None)
        );
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        // Rejected while parsing, before the key or clock is consulted.
        let deps = Unimock::new(());
        assert_matches!(
            authenticate::authenticate(&deps, Token::from_token("not.a.jwt")),
            Err(FeedError::Unauthorized)
        );
    }

    #[test]
    fn token_signed_with_another_key_is_unauthorized() {
        use hmac::Mac;

        let signing_deps = Unimock::new(crate::test::mock_system_and_config());
        let token = sign_account_id(&signing_deps, test_account_id());

        let other_key = Unimock::new(
            GetConfigMock::get_jwt_signing_key
                .each_call(matching!())
                .returns(hmac::Hmac::<sha2::Sha384>::new_from_slice(b"not-foobar").unwrap()),
        );

        assert_matches!(
            authenticate::authenticate(&other_key, Token::from_token(&token)),
            Err(FeedError::Unauthorized)
        );
    }

    #[test]
    fn expired_token_is_unauthorized() {
        use hmac::Mac;

        let signing_deps = Unimock::new(crate::test::mock_system_and_config());
        let token = sign_account_id(&signing_deps, test_account_id());

        let three_weeks_later = Unimock::new((
            SystemMock::get_current_time
                .each_call(matching!())
                .returns(time::OffsetDateTime::from_unix_timestamp(0).unwrap() + time::Duration::weeks(3)),
            GetConfigMock::get_jwt_signing_key
                .each_call(matching!())
                .returns(hmac::Hmac::<sha2::Sha384>::new_from_slice(b"foobar").unwrap()),
        ));

        assert_matches!(
            authenticate::authenticate(&three_weeks_later, Token::from_token(&token)),
            Err(FeedError::Unauthorized)
        );
    }

    #[test]
    fn bearer_header_should_decode() {
        let token = Token::decode(&HeaderValue::from_static("Bearer abc.def")).unwrap();
        assert_eq!("abc.def", token.token());
        assert_eq!("Bearer abc.def", token.encode().to_str().unwrap());
        assert!(Token::decode(&HeaderValue::from_static("Bearer ")).is_none());
    }
}
