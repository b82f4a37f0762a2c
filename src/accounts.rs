//! Account store
//!
//! Registration creates a pending account; an admin approves or rejects it.
//! Credentials are handled outside this crate.

use thiserror::Error;

use crate::activity;
use crate::db::{queries, Database, DbError};
use crate::kpi::Industry;
use crate::models::{Account, AccountStatus, ActivityKind, Role};

/// Account store errors
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Industry field must not be empty")]
    EmptyField,

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("User not found: {0}")]
    UnknownUser(String),

    #[error("An admin account already exists")]
    AdminExists,

    #[error(transparent)]
    Database(#[from] DbError),
}

/// `local@domain.tld` with a letters-only TLD of at least two characters
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

fn validate(username: &str, email: &str, field: &Industry) -> Result<(), AccountError> {
    if username.trim().is_empty() {
        return Err(AccountError::EmptyUsername);
    }
    if !is_valid_email(email) {
        return Err(AccountError::InvalidEmail(email.to_string()));
    }
    if field.label().trim().is_empty() {
        return Err(AccountError::EmptyField);
    }
    Ok(())
}

fn create(
    db: &Database,
    username: &str,
    email: &str,
    field: Industry,
    role: Role,
    status: AccountStatus,
) -> Result<Account, AccountError> {
    validate(username, email, &field)?;

    let account = Account {
        username: username.trim().to_string(),
        email: email.to_string(),
        field,
        role,
        status,
        created_at: queries::now_timestamp(),
    };

    let inserted = db.with_connection(|conn| {
        if queries::user_exists(conn, &account.username)? {
            return Ok(false);
        }
        queries::insert_user(conn, &account)?;
        Ok(true)
    })?;
    if !inserted {
        return Err(AccountError::UsernameTaken(account.username));
    }

    Ok(account)
}

/// Sign up a new user; the account starts pending approval
pub fn register(
    db: &Database,
    username: &str,
    email: &str,
    field: Industry,
) -> Result<Account, AccountError> {
    let account = create(db, username, email, field, Role::User, AccountStatus::Pending)?;
    tracing::info!("Registered {} ({})", account.username, account.field);
    activity::record(db, &account.username, ActivityKind::Registration, account.field.label());
    Ok(account)
}

/// Create the first, already approved, admin account
///
/// Fails once any admin exists.
pub fn bootstrap_admin(
    db: &Database,
    username: &str,
    email: &str,
    field: Industry,
) -> Result<Account, AccountError> {
    if db.with_connection(queries::count_admins)? > 0 {
        return Err(AccountError::AdminExists);
    }
    let account = create(db, username, email, field, Role::Admin, AccountStatus::Approved)?;
    tracing::info!("Created admin account {}", account.username);
    Ok(account)
}

/// Look up an account
pub fn find(db: &Database, username: &str) -> Result<Option<Account>, AccountError> {
    Ok(db.with_connection(|conn| queries::get_user(conn, username))?)
}

/// Approve or reject an account
pub fn set_status(
    db: &Database,
    admin: &str,
    username: &str,
    status: AccountStatus,
) -> Result<(), AccountError> {
    let changed = db.with_connection(|conn| queries::update_user_status(conn, username, status))?;
    if !changed {
        return Err(AccountError::UnknownUser(username.to_string()));
    }

    tracing::info!("{} set account {} to {}", admin, username, status.as_str());
    activity::record(
        db,
        admin,
        ActivityKind::AccountStatus,
        &format!("{} -> {}", username, status.as_str()),
    );
    Ok(())
}

/// Accounts in a given approval state
pub fn users_by_status(db: &Database, status: AccountStatus) -> Result<Vec<Account>, AccountError> {
    Ok(db.with_connection(|conn| queries::get_users_by_status(conn, status))?)
}
