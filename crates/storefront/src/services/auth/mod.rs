//! Authentication service.
//!
//! Password registration and login against the [`Store`], plus the token
//! service that issues and verifies access tokens.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, IssuedToken, TOKEN_COOKIE, TOKEN_TTL_SECS, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use threadline_core::Email;

use crate::db::{RepositoryError, Store};
use crate::models::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new customer account.
    ///
    /// Input shape (non-empty username, password length) is checked by the
    /// caller; this only hashes and persists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        username: &str,
        email: Email,
        password: &str,
    ) -> Result<User, AuthError> {
        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(NewUser {
                username: username.to_owned(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .store
            .user_with_password(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(user)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
