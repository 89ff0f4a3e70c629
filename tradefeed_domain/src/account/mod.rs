pub mod auth;
pub mod handle;
pub mod password;
pub mod repo;

use auth::{Authenticate, SignAccountId, Token};
use handle::Email;
use password::{CleartextPassword, HashPassword, VerifyPassword};
use repo::AccountRepo;

use crate::error::{FeedError, FeedResult};

use entrait::entrait_export as entrait;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Parse an account id received from a caller.
    pub fn parse(input: &str) -> FeedResult<Self> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| FeedError::validation(format!("malformed account id: {input:?}")))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Member,
    /// Paying subscriber.
    ServiceUser,
    ServiceProvider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::ServiceUser => "service_user",
            Self::ServiceProvider => "service_provider",
            Self::Admin => "admin",
        }
    }
}

/// Roles are only ever parsed from stored rows, so an unknown tag means the
/// store holds something this code does not understand.
impl FromStr for Role {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "service_user" => Ok(Self::ServiceUser),
            "service_provider" => Ok(Self::ServiceProvider),
            "admin" => Ok(Self::Admin),
            other => Err(FeedError::DataIntegrity(format!("unknown role: {other:?}"))),
        }
    }
}

/// Public author fields attached to every post and comment.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AccountId,
    pub handle: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub role: Role,
}

impl Author {
    /// Stand-in for an author whose account could not be found.
    pub fn placeholder(id: AccountId) -> Self {
        Self {
            id,
            handle: "unknown".to_string(),
            display_name: "unknown".to_string(),
            avatar: None,
            role: Role::Member,
        }
    }
}

impl From<repo::Account> for Author {
    fn from(account: repo::Account) -> Self {
        Self {
            id: account.account_id,
            handle: account.handle,
            display_name: account.display_name,
            avatar: account.avatar,
            role: account.role,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignedAccount {
    pub id: AccountId,
    pub email: String,
    pub token: String,
    pub handle: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub handle: String,
    pub email: String,
    pub password: CleartextPassword,
    pub display_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginAccount {
    pub email: String,
    pub password: CleartextPassword,
}

#[derive(serde::Serialize, serde::Deserialize, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileEdit {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
}

#[entrait(pub AccountApi, mock_api=AccountApiMock)]
pub mod api {
    use super::*;

    pub async fn register(
        deps: &(impl HashPassword + AccountRepo + SignAccountId),
        registration: Registration,
    ) -> FeedResult<SignedAccount> {
        handle::validate_handle(&registration.handle)?;
        let email: Email = registration.email.parse()?;
        registration.password.validate()?;
        let display_name = non_blank("display name", &registration.display_name)?;

        let password_hash = deps.hash_password(registration.password).await?;

        let (account, credentials) = deps
            .insert_account(repo::NewAccount {
                handle: &registration.handle,
                email: &email,
                display_name,
                avatar: registration.avatar.as_deref(),
                bio: registration.bio.as_deref(),
                password_hash,
            })
            .await?;

        tracing::info!(account_id = %account.account_id, handle = %account.handle, "registered account");

        Ok(sign(deps, account, credentials))
    }

    pub async fn login(
        deps: &(impl AccountRepo + VerifyPassword + SignAccountId),
        login: LoginAccount,
    ) -> FeedResult<SignedAccount> {
        // A malformed email can never match, and must not reveal anything else.
        let email: Email = login.email.parse().map_err(|_| FeedError::Unauthorized)?;

        let (account, credentials) = deps
            .find_account_credentials_by_email(&email)
            .await?
            .ok_or(FeedError::Unauthorized)?;

        deps.verify_password(login.password, credentials.password_hash.clone())
            .await?;

        Ok(sign(deps, account, credentials))
    }

    pub async fn fetch_current_account(
        deps: &(impl Authenticate + AccountRepo + SignAccountId),
        token: Token,
    ) -> FeedResult<SignedAccount> {
        let account_id = deps.authenticate(token)?;
        let (account, credentials) = deps
            .find_account_credentials_by_id(account_id)
            .await?
            .ok_or(FeedError::AccountNotFound)?;

        Ok(sign(deps, account, credentials))
    }

    pub async fn edit_profile(
        deps: &(impl Authenticate + AccountRepo + SignAccountId),
        token: Token,
        edit: ProfileEdit,
    ) -> FeedResult<SignedAccount> {
        let account_id = deps.authenticate(token)?;
        let display_name = edit
            .display_name
            .as_deref()
            .map(|display_name| non_blank("display name", display_name))
            .transpose()?;

        let (account, credentials) = deps
            .update_account(
                account_id,
                repo::AccountUpdate {
                    display_name,
                    avatar: edit.avatar.as_deref(),
                    bio: edit.bio.as_deref(),
                },
            )
            .await?;

        Ok(sign(deps, account, credentials))
    }

    fn sign(
        deps: &impl SignAccountId,
        account: repo::Account,
        credentials: repo::Credentials,
    ) -> SignedAccount {
        SignedAccount {
            id: account.account_id,
            email: credentials.email.as_ref().to_string(),
            token: deps.sign_account_id(account.account_id),
            handle: account.handle,
            display_name: account.display_name,
            avatar: account.avatar,
            bio: account.bio,
            role: account.role,
        }
    }

    fn non_blank<'s>(field: &str, value: &'s str) -> FeedResult<&'s str> {
        let value = value.trim();
        if value.is_empty() {
            Err(FeedError::validation(format!("{field} must not be blank")))
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::auth::authenticate::AuthenticateMock;
    use super::auth::SignAccountIdMock;
    use super::password::{HashPasswordMock, PasswordHash, VerifyPasswordMock};
    use super::repo::AccountRepoMock;
    use super::*;

    use assert_matches::*;
    use unimock::*;

    pub fn test_account_id() -> AccountId {
        AccountId(Uuid::parse_str("20a626ba-c7d3-44c7-981a-e880f81c126f").unwrap())
    }

    pub fn test_account(handle: &str) -> repo::Account {
        repo::Account {
            account_id: test_account_id(),
            handle: handle.to_string(),
            display_name: "Sarah".to_string(),
            avatar: Some("https://cdn.example.com/sarah.png".to_string()),
            bio: None,
            role: Role::ServiceProvider,
            created_at: time::OffsetDateTime::from_unix_timestamp(0).unwrap(),
        }
    }

    fn test_credentials() -> repo::Credentials {
        repo::Credentials {
            email: Email::valid("sarah@example.com".to_string()),
            password_hash: PasswordHash("h4sh".to_string()),
        }
    }

    fn test_registration() -> Registration {
        Registration {
            handle: "sarah.trading".to_string(),
            email: "sarah@example.com".to_string(),
            password: "password".into(),
            display_name: "Sarah".to_string(),
            avatar: None,
            bio: None,
        }
    }

    #[tokio::test]
    async fn register_should_hash_insert_and_sign() {
        let deps = Unimock::new((
            HashPasswordMock
                .next_call(matching!(_))
                .returns(Ok(PasswordHash("h4sh".to_string()))),
            AccountRepoMock::insert_account
                .next_call(matching!(_))
                .returns(Ok((test_account("sarah.trading"), test_credentials()))),
            SignAccountIdMock
                .next_call(matching!(_))
                .returns("t0k3n".to_string()),
        ));

        let signed = api::register(&deps, test_registration()).await.unwrap();

        assert_eq!("t0k3n", signed.token);
        assert_eq!("sarah@example.com", signed.email);
        assert_eq!("sarah.trading", signed.handle);
        assert_eq!(Role::ServiceProvider, signed.role);
    }

    #[tokio::test]
    async fn register_should_validate_before_touching_the_store() {
        let deps = Unimock::new(());

        let bad_handle = Registration {
            handle: "no spaces".to_string(),
            ..test_registration()
        };
        assert_matches!(
            api::register(&deps, bad_handle).await,
            Err(FeedError::Validation(_))
        );

        let bad_email = Registration {
            email: "nada_neutho".to_string(),
            ..test_registration()
        };
        assert_matches!(
            api::register(&deps, bad_email).await,
            Err(FeedError::Validation(_))
        );

        let short_password = Registration {
            password: "short".into(),
            ..test_registration()
        };
        assert_matches!(
            api::register(&deps, short_password).await,
            Err(FeedError::Validation(_))
        );

        let blank_name = Registration {
            display_name: "  ".to_string(),
            ..test_registration()
        };
        assert_matches!(
            api::register(&deps, blank_name).await,
            Err(FeedError::Validation(_))
        );
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_unauthorized() {
        let deps = Unimock::new(
            AccountRepoMock::find_account_credentials_by_email
                .next_call(matching!(_))
                .returns(Ok(None)),
        );

        assert_matches!(
            api::login(
                &deps,
                LoginAccount {
                    email: "nobody@example.com".to_string(),
                    password: "password".into(),
                }
            )
            .await,
            Err(FeedError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn login_should_verify_and_sign() {
        let deps = Unimock::new((
            AccountRepoMock::find_account_credentials_by_email
                .next_call(matching!(_))
                .returns(Ok(Some((test_account("sarah"), test_credentials())))),
            VerifyPasswordMock.next_call(matching!(_)).returns(Ok(())),
            SignAccountIdMock
                .next_call(matching!(_))
                .returns("t0k3n".to_string()),
        ));

        let signed = api::login(
            &deps,
            LoginAccount {
                email: "sarah@example.com".to_string(),
                password: "password".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!("t0k3n", signed.token);
        assert_eq!(test_account_id(), signed.id);
    }

    #[tokio::test]
    async fn edit_profile_rejects_blank_display_name() {
        let deps = Unimock::new(
            AuthenticateMock::authenticate
                .next_call(matching!(_))
                .returns(Ok(test_account_id())),
        );

        assert_matches!(
            api::edit_profile(
                &deps,
                Token::from_token("token"),
                ProfileEdit {
                    display_name: Some("".to_string()),
                    ..Default::default()
                }
            )
            .await,
            Err(FeedError::Validation(_))
        );
    }

    #[test]
    fn roles_parse_and_reject_unknown_tags() {
        assert_eq!(Role::ServiceUser, "service_user".parse().unwrap());
        assert_eq!("admin", Role::Admin.as_str());
        assert_matches!("wizard".parse::<Role>(), Err(FeedError::DataIntegrity(_)));
    }

    #[test]
    fn placeholder_author_is_an_unknown_member() {
        let author = Author::placeholder(test_account_id());
        assert_eq!("unknown", author.handle);
        assert_eq!("unknown", author.display_name);
        assert_eq!(None, author.avatar);
        assert_eq!(Role::Member, author.role);
    }

    #[test]
    fn malformed_account_id_is_a_validation_failure() {
        assert_matches!(AccountId::parse("not-a-uuid"), Err(FeedError::Validation(_)));
        assert_eq!(
            test_account_id(),
            AccountId::parse("20a626ba-c7d3-44c7-981a-e880f81c126f").unwrap()
        );
    }
}
