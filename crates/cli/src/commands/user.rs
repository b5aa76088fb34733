//! Account management commands.
//!
//! Registration always creates customers; staff roles are granted here.
//!
//! # Usage
//!
//! ```bash
//! tl-cli user set-role -e staff@example.com -r distributor
//! ```

use threadline_core::{Email, Role};
use threadline_storefront::db::{PgStore, RepositoryError, Store};

use super::{CliError, connect};

/// Change the role of the account with `email`.
///
/// # Errors
///
/// Returns `CliError::InvalidRole` or `CliError::InvalidEmail` for bad input,
/// `CliError::UserNotFound` if no account has the email.
pub async fn set_role(email: &str, role: &str) -> Result<(), CliError> {
    let (email, role) = parse_args(email, role)?;

    let store = PgStore::new(connect().await?);
    let user = store.set_user_role(&email, role).await.map_err(|e| match e {
        RepositoryError::NotFound => CliError::UserNotFound(email.to_string()),
        other => CliError::Repository(other),
    })?;

    tracing::info!(user_id = %user.id, role = %user.role, "Role updated for {}", user.username);
    Ok(())
}

fn parse_args(email: &str, role: &str) -> Result<(Email, Role), CliError> {
    let role: Role = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;
    Ok((email, role))
}
