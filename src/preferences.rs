//! Per-user KPI preferences
//!
//! A user's preferences are the set of KPI identifiers they opted into.
//! Saving replaces the whole set. Identifiers are not checked against the
//! catalogue; unknown ones are kept and ignored at computation time.

use std::collections::{BTreeMap, BTreeSet};

use crate::db::{queries, Database, DbError};

/// Enabled KPI identifiers
pub type KpiSelection = BTreeSet<String>;

/// Build a selection from any list of identifiers
pub fn selection<I, S>(ids: I) -> KpiSelection
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Storage seam for KPI preferences
pub trait PreferenceStore {
    /// Enabled identifiers of `username`; empty when nothing was saved
    fn kpi_selection(&self, username: &str) -> Result<KpiSelection, DbError>;

    /// Replace the enabled identifiers of `username`
    fn save_kpi_selection(&self, username: &str, selection: &KpiSelection) -> Result<(), DbError>;
}

impl PreferenceStore for Database {
    fn kpi_selection(&self, username: &str) -> Result<KpiSelection, DbError> {
        let stored = self.with_connection(|conn| queries::get_kpi_preferences(conn, username))?;
        Ok(stored
            .unwrap_or_default()
            .into_iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(id, _)| id)
            .collect())
    }

    fn save_kpi_selection(&self, username: &str, selection: &KpiSelection) -> Result<(), DbError> {
        let flags: BTreeMap<String, bool> =
            selection.iter().map(|id| (id.clone(), true)).collect();
        self.with_connection(|conn| queries::save_kpi_preferences(conn, username, &flags))?;
        tracing::info!("Saved {} KPI preferences for {}", selection.len(), username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    #[test]
    fn test_empty_when_never_saved() {
        let db = test_db();
        assert!(db.kpi_selection("alice").unwrap().is_empty());
    }

    #[test]
    fn test_save_is_full_replace() {
        let db = test_db();
        db.save_kpi_selection("alice", &selection(["cycle_time", "fpy", "oee"]))
            .unwrap();
        db.save_kpi_selection("alice", &selection(["oee", "yield"]))
            .unwrap();

        assert_eq!(db.kpi_selection("alice").unwrap(), selection(["oee", "yield"]));
    }

    #[test]
    fn test_unknown_ids_are_kept() {
        let db = test_db();
        db.save_kpi_selection("alice", &selection(["oee", "not_a_kpi"]))
            .unwrap();
        assert!(db.kpi_selection("alice").unwrap().contains("not_a_kpi"));
    }

    #[test]
    fn test_users_are_isolated() {
        let db = test_db();
        db.save_kpi_selection("alice", &selection(["oee"])).unwrap();
        db.save_kpi_selection("bob", &selection(["yield"])).unwrap();
        assert_eq!(db.kpi_selection("alice").unwrap(), selection(["oee"]));
    }

    #[test]
    fn test_disabled_flags_are_not_selected() {
        let db = test_db();
        let mut flags = BTreeMap::new();
        flags.insert("oee".to_string(), true);
        flags.insert("fpy".to_string(), false);
        db.with_connection(|conn| queries::save_kpi_preferences(conn, "alice", &flags))
            .unwrap();

        assert_eq!(db.kpi_selection("alice").unwrap(), selection(["oee"]));
    }
}
