//! Per-interaction request context
//!
//! Every handler receives the acting user explicitly instead of reading
//! process-wide session state. A context exists only for approved accounts.

use serde::Serialize;
use thiserror::Error;

use crate::db::{queries, Database, DbError};
use crate::kpi::Industry;
use crate::models::{AccountStatus, Role};

/// Access control errors
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Account {0} is pending approval")]
    PendingApproval(String),

    #[error("Account {0} was rejected")]
    Rejected(String),

    #[error("Admin privileges required")]
    AdminRequired,

    #[error(transparent)]
    Database(#[from] DbError),
}

/// The user an interaction runs as
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestContext {
    pub username: String,
    pub role: Role,
    pub industry: Industry,
}

impl RequestContext {
    /// Resolve the acting user from the account store
    pub fn establish(db: &Database, username: &str) -> Result<Self, AccessError> {
        let account = db
            .with_connection(|conn| queries::get_user(conn, username))?
            .ok_or_else(|| AccessError::UnknownUser(username.to_string()))?;

        match account.status {
            AccountStatus::Approved => Ok(Self {
                username: account.username,
                role: account.role,
                industry: account.field,
            }),
            AccountStatus::Pending => Err(AccessError::PendingApproval(account.username)),
            AccountStatus::Rejected => Err(AccessError::Rejected(account.username)),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Gate for admin-only operations
    pub fn require_admin(&self) -> Result<(), AccessError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AccessError::AdminRequired)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts;
    use crate::db::test_db;

    #[test]
    fn test_only_approved_accounts_get_a_context() {
        let db = test_db();
        accounts::register(&db, "alice", "alice@plant.example", Industry::FoodAndBeverage)
            .unwrap();

        assert!(matches!(
            RequestContext::establish(&db, "alice"),
            Err(AccessError::PendingApproval(_))
        ));
        assert!(matches!(
            RequestContext::establish(&db, "nobody"),
            Err(AccessError::UnknownUser(_))
        ));

        accounts::set_status(&db, "root", "alice", AccountStatus::Approved).unwrap();
        let ctx = RequestContext::establish(&db, "alice").unwrap();
        assert_eq!(ctx.industry, Industry::FoodAndBeverage);
        assert!(matches!(ctx.require_admin(), Err(AccessError::AdminRequired)));

        accounts::set_status(&db, "root", "alice", AccountStatus::Rejected).unwrap();
        assert!(matches!(
            RequestContext::establish(&db, "alice"),
            Err(AccessError::Rejected(_))
        ));
    }

    #[test]
    fn test_admin_context() {
        let db = test_db();
        accounts::bootstrap_admin(&db, "root", "root@plant.example", Industry::OilAndGas)
            .unwrap();
        let ctx = RequestContext::establish(&db, "root").unwrap();
        assert!(ctx.require_admin().is_ok());
    }
}
