//! Signup, login and bearer token resolution.

use chrono::Duration;
use tracing::{debug, info, warn};

use scrivo_core::validation::validate_signup;
use scrivo_core::{Error, FieldErrors, IssuedToken, NewUser, Result, Stores, User, UserProfile};

use super::password::{hash_password, verify_decoy, verify_password};

pub const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
pub const CREDENTIALS_REQUIRED: &str = "Both username and password are required";
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Account use-cases over the user and token stores.
#[derive(Clone)]
pub struct AccountService {
    stores: Stores,
    token_ttl: Duration,
}

impl AccountService {
    pub fn new(stores: Stores, token_ttl: Duration) -> Self {
        Self { stores, token_ttl }
    }

    /// Register a new user.
    pub async fn signup(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<UserProfile> {
        let fields = validate_signup(username, email, password)?;

        // Fast path for the common duplicate; the unique index still decides races.
        if self
            .stores
            .users
            .find_by_username(&fields.username)
            .await?
            .is_some()
        {
            return Err(FieldErrors::single("username", DUPLICATE_USERNAME).into());
        }

        let password_hash = hash_password(&fields.password)?;
        let user = self
            .stores
            .users
            .insert(NewUser {
                username: fields.username,
                email: fields.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                Error::Conflict(_) => FieldErrors::single("username", DUPLICATE_USERNAME).into(),
                other => other,
            })?;

        info!(
            subsystem = "auth",
            component = "accounts",
            op = "signup",
            user_id = user.id,
            username = %user.username,
            "User registered"
        );
        Ok(user.profile())
    }

    /// Check credentials and issue a bearer token.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(IssuedToken, UserProfile)> {
        let (Some(username), Some(password)) = (
            username.filter(|u| !u.is_empty()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(Error::InvalidInput(CREDENTIALS_REQUIRED.to_string()));
        };

        let verified = match self.stores.users.find_by_username(username).await? {
            Some(user) => verify_password(password, &user.password_hash)?.then_some(user),
            None => {
                verify_decoy(password);
                None
            }
        };
        let user = match verified {
            Some(user) => user,
            None => {
                warn!(
                    subsystem = "auth",
                    component = "accounts",
                    op = "login",
                    username = %username,
                    "Login rejected"
                );
                return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        let token = self.stores.tokens.issue(user.id, self.token_ttl).await?;
        info!(
            subsystem = "auth",
            component = "accounts",
            op = "login",
            user_id = user.id,
            "Token issued"
        );
        Ok((token, user.profile()))
    }

    /// Resolve a presented bearer token to its user.
    ///
    /// Unknown, expired and orphaned tokens all yield `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>> {
        let Some(user_id) = self.stores.tokens.resolve(token).await? else {
            debug!(subsystem = "auth", component = "tokens", "Token not recognised");
            return Ok(None);
        };
        self.stores.users.fetch(user_id).await
    }

    /// Drop expired tokens.
    pub async fn purge_expired_tokens(&self) -> Result<u64> {
        self.stores.tokens.purge_expired().await
    }
}
