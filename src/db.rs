use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::bookmarks::{SavedStore, Session};
use crate::models::{EligibilityMap, Internship, Report, ReportStatus, UserPreferences};

/// Local document store. Internship listings are kept as JSON documents keyed
/// by id (mirroring the hosted document database they sync from); everything
/// per-user (saved set, preferences, eligibility, session) lives in side
/// tables.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        Ok(Self { conn, path })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, path: PathBuf::from(":memory:") };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn default_path() -> Result<PathBuf> {
        // Use XDG data directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "internyl") {
            Ok(proj_dirs.data_dir().join("internyl.db"))
        } else {
            // Fallback to current directory
            Ok(PathBuf::from("internyl.db"))
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS internships (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                doc TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS saved (
                user_id TEXT NOT NULL,
                internship_id TEXT NOT NULL,
                PRIMARY KEY (user_id, internship_id)
            );

            CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                user_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                internship_id TEXT NOT NULL,
                user_id TEXT,
                reason TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'resolved', 'rejected')),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                resolved_at TEXT,
                resolved_by TEXT,
                rejected_at TEXT,
                rejected_by TEXT,
                notes TEXT
            );

            CREATE TABLE IF NOT EXISTS preferences (
                user_id TEXT PRIMARY KEY,
                doc TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS eligibility (
                user_id TEXT NOT NULL,
                internship_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                satisfied INTEGER NOT NULL,
                PRIMARY KEY (user_id, internship_id, item_id)
            );

            CREATE INDEX IF NOT EXISTS idx_saved_user ON saved(user_id);
            CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='internships'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'internyl init' first."
            ));
        }
        Ok(())
    }

    // --- Internship documents ---

    pub fn upsert_internship(&self, internship: &Internship) -> Result<()> {
        let doc = serde_json::to_string(internship)
            .with_context(|| format!("Failed to serialize internship '{}'", internship.id))?;
        self.conn.execute(
            "INSERT INTO internships (id, title, doc) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                doc = excluded.doc,
                updated_at = datetime('now')",
            params![internship.id, internship.title, doc],
        )?;
        Ok(())
    }

    pub fn get_internship(&self, id: &str) -> Result<Option<Internship>> {
        let doc: Option<String> = self
            .conn
            .query_row("SELECT doc FROM internships WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        match doc {
            Some(doc) => Ok(Some(Self::doc_to_internship(id, &doc)?)),
            None => Ok(None),
        }
    }

    /// List internships, optionally filtered by a case-insensitive title
    /// substring (the `search` parameter's filtering role).
    pub fn list_internships(&self, search: Option<&str>) -> Result<Vec<Internship>> {
        let mut sql = String::from("SELECT id, doc FROM internships");
        if search.is_some() {
            sql.push_str(" WHERE instr(LOWER(title), LOWER(?1)) > 0");
        }
        sql.push_str(" ORDER BY title");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<(String, String)> = if let Some(q) = search {
            stmt.query_map([q], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?
        };

        rows.iter()
            .map(|(id, doc)| Self::doc_to_internship(id, doc))
            .collect()
    }

    fn doc_to_internship(id: &str, doc: &str) -> Result<Internship> {
        serde_json::from_str(doc)
            .with_context(|| format!("Corrupt internship document '{}'", id))
    }

    // --- Saved set ---

    pub fn is_saved(&self, user_id: &str, internship_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM saved WHERE user_id = ?1 AND internship_id = ?2",
            [user_id, internship_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn saved_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT internship_id FROM saved WHERE user_id = ?1")?;
        let ids = stmt
            .query_map([user_id], |row| row.get(0))?
            .collect::<Result<HashSet<String>, _>>()?;
        Ok(ids)
    }

    // --- Session ---

    pub fn set_session(&self, user_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO session (id, user_id) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET user_id = excluded.user_id",
            [user_id],
        )?;
        Ok(())
    }

    pub fn clear_session(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session", [])?;
        Ok(())
    }

    /// The current signed-in user, or None when signed out.
    pub fn current_session(&self) -> Result<Option<Session>> {
        let user_id: Option<String> = self
            .conn
            .query_row("SELECT user_id FROM session WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(user_id.map(|user_id| Session { user_id }))
    }

    // --- Reports ---

    pub fn create_report(
        &self,
        internship_id: &str,
        user_id: Option<&str>,
        reason: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO reports (internship_id, user_id, reason) VALUES (?1, ?2, ?3)",
            params![internship_id, user_id, reason],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_report(&self, id: i64) -> Result<Option<Report>> {
        self.conn
            .query_row(
                "SELECT id, internship_id, user_id, reason, status, created_at,
                        resolved_at, resolved_by, rejected_at, rejected_by, notes
                 FROM reports WHERE id = ?1",
                [id],
                Self::row_to_report,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let mut sql = String::from(
            "SELECT id, internship_id, user_id, reason, status, created_at,
                    resolved_at, resolved_by, rejected_at, rejected_by, notes
             FROM reports",
        );
        if status.is_some() {
            sql.push_str(" WHERE status = ?1");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if let Some(s) = status {
            stmt.query_map([s.as_str()], Self::row_to_report)?
        } else {
            stmt.query_map([], Self::row_to_report)?
        };

        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list reports")
    }

    /// Close a pending report as resolved. The status guard keeps the
    /// lifecycle monotonic: a resolved or rejected report never reopens.
    pub fn resolve_report(&self, id: i64, resolver: &str, notes: Option<&str>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE reports
             SET status = 'resolved',
                 resolved_at = datetime('now'),
                 resolved_by = ?1,
                 notes = COALESCE(?2, notes)
             WHERE id = ?3 AND status = 'pending'",
            params![resolver, notes, id],
        )?;
        if changed == 0 {
            return Err(anyhow!("Report #{} not found or already closed", id));
        }
        Ok(())
    }

    pub fn reject_report(&self, id: i64, rejecter: &str, notes: Option<&str>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE reports
             SET status = 'rejected',
                 rejected_at = datetime('now'),
                 rejected_by = ?1,
                 notes = COALESCE(?2, notes)
             WHERE id = ?3 AND status = 'pending'",
            params![rejecter, notes, id],
        )?;
        if changed == 0 {
            return Err(anyhow!("Report #{} not found or already closed", id));
        }
        Ok(())
    }

    fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
        let status_text: String = row.get(4)?;
        let status = ReportStatus::parse(&status_text).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown report status '{}'", status_text).into(),
            )
        })?;
        Ok(Report {
            id: row.get(0)?,
            internship_id: row.get(1)?,
            user_id: row.get(2)?,
            reason: row.get(3)?,
            status,
            created_at: row.get(5)?,
            resolved_at: row.get(6)?,
            resolved_by: row.get(7)?,
            rejected_at: row.get(8)?,
            rejected_by: row.get(9)?,
            notes: row.get(10)?,
        })
    }

    // --- Preferences ---

    pub fn set_preferences(&self, user_id: &str, prefs: &UserPreferences) -> Result<()> {
        let doc = serde_json::to_string(prefs).context("Failed to serialize preferences")?;
        self.conn.execute(
            "INSERT INTO preferences (user_id, doc) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET doc = excluded.doc",
            params![user_id, doc],
        )?;
        Ok(())
    }

    pub fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        let doc: Option<String> = self
            .conn
            .query_row(
                "SELECT doc FROM preferences WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;
        match doc {
            Some(doc) => Ok(Some(
                serde_json::from_str(&doc).context("Corrupt preferences document")?,
            )),
            None => Ok(None),
        }
    }

    // --- Eligibility ---

    pub fn set_eligibility(
        &self,
        user_id: &str,
        internship_id: &str,
        item_id: &str,
        satisfied: bool,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO eligibility (user_id, internship_id, item_id, satisfied)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, internship_id, item_id)
             DO UPDATE SET satisfied = excluded.satisfied",
            params![user_id, internship_id, item_id, satisfied],
        )?;
        Ok(())
    }

    /// Recorded eligibility answers for one internship. Items never recorded
    /// are simply absent from the map: unknown, not false.
    pub fn get_eligibility(
        &self,
        user_id: &str,
        internship_id: &str,
    ) -> Result<std::collections::HashMap<String, bool>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, satisfied FROM eligibility
             WHERE user_id = ?1 AND internship_id = ?2",
        )?;
        let rows = stmt
            .query_map([user_id, internship_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })?
            .collect::<Result<std::collections::HashMap<_, _>, _>>()?;
        Ok(rows)
    }

    pub fn all_eligibility(&self, user_id: &str) -> Result<EligibilityMap> {
        let mut stmt = self.conn.prepare(
            "SELECT internship_id, item_id, satisfied FROM eligibility WHERE user_id = ?1",
        )?;
        let mut map = EligibilityMap::new();
        let rows = stmt.query_map([user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;
        for row in rows {
            let (internship_id, item_id, satisfied) = row?;
            map.entry(internship_id).or_default().insert(item_id, satisfied);
        }
        Ok(map)
    }
}

impl SavedStore for Database {
    fn add_saved(&self, user_id: &str, internship_id: &str) -> Result<()> {
        // INSERT OR IGNORE gives set-union semantics: adding twice is a no-op.
        self.conn.execute(
            "INSERT OR IGNORE INTO saved (user_id, internship_id) VALUES (?1, ?2)",
            [user_id, internship_id],
        )?;
        Ok(())
    }

    fn remove_saved(&self, user_id: &str, internship_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM saved WHERE user_id = ?1 AND internship_id = ?2",
            [user_id, internship_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateField, DurationField};

    fn internship(id: &str, title: &str) -> Internship {
        Internship {
            id: id.to_string(),
            title: title.to_string(),
            organization: None,
            link: None,
            duration_weeks: Some(DurationField::Weeks(8.0)),
            cost: None,
            deadlines: vec![],
            date_added: Some(DateField::Text("2026-08-25".to_string())),
        }
    }

    #[test]
    fn test_internship_document_round_trip() {
        let db = Database::in_memory().unwrap();
        db.upsert_internship(&internship("abc", "Marine Biology")).unwrap();

        let loaded = db.get_internship("abc").unwrap().unwrap();
        assert_eq!(loaded.title, "Marine Biology");
        assert!(matches!(loaded.duration_weeks, Some(DurationField::Weeks(w)) if w == 8.0));

        assert!(db.get_internship("missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_document() {
        let db = Database::in_memory().unwrap();
        db.upsert_internship(&internship("abc", "Old Title")).unwrap();
        db.upsert_internship(&internship("abc", "New Title")).unwrap();

        let all = db.list_internships(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "New Title");
    }

    #[test]
    fn test_list_internships_search_filter() {
        let db = Database::in_memory().unwrap();
        db.upsert_internship(&internship("a", "Marine Biology Program")).unwrap();
        db.upsert_internship(&internship("b", "Robotics Lab")).unwrap();

        let hits = db.list_internships(Some("marine")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");

        let none = db.list_internships(Some("finance")).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_saved_set_ops_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.add_saved("u1", "abc").unwrap();
        db.add_saved("u1", "abc").unwrap();
        assert!(db.is_saved("u1", "abc").unwrap());
        assert_eq!(db.saved_ids("u1").unwrap().len(), 1);

        db.remove_saved("u1", "abc").unwrap();
        db.remove_saved("u1", "abc").unwrap();
        assert!(!db.is_saved("u1", "abc").unwrap());
    }

    #[test]
    fn test_saved_sets_are_per_user() {
        let db = Database::in_memory().unwrap();
        db.add_saved("u1", "abc").unwrap();
        assert!(!db.is_saved("u2", "abc").unwrap());
    }

    #[test]
    fn test_session_set_and_clear() {
        let db = Database::in_memory().unwrap();
        assert!(db.current_session().unwrap().is_none());

        db.set_session("u1").unwrap();
        assert_eq!(db.current_session().unwrap().unwrap().user_id, "u1");

        db.set_session("u2").unwrap();
        assert_eq!(db.current_session().unwrap().unwrap().user_id, "u2");

        db.clear_session().unwrap();
        assert!(db.current_session().unwrap().is_none());
    }

    #[test]
    fn test_report_lifecycle_resolve() {
        let db = Database::in_memory().unwrap();
        let id = db.create_report("abc", Some("u1"), "Broken link").unwrap();

        let report = db.get_report(id).unwrap().unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert!(report.resolved_at.is_none());

        db.resolve_report(id, "admin", Some("Fixed the link")).unwrap();
        let report = db.get_report(id).unwrap().unwrap();
        assert_eq!(report.status, ReportStatus::Resolved);
        assert_eq!(report.resolved_by.as_deref(), Some("admin"));
        assert!(report.resolved_at.is_some());
        assert_eq!(report.notes.as_deref(), Some("Fixed the link"));
    }

    #[test]
    fn test_report_lifecycle_is_monotonic() {
        let db = Database::in_memory().unwrap();
        let id = db.create_report("abc", None, "Spam").unwrap();
        db.reject_report(id, "admin", None).unwrap();

        // Once closed, neither transition applies again.
        assert!(db.resolve_report(id, "admin", None).is_err());
        assert!(db.reject_report(id, "admin", None).is_err());

        let report = db.get_report(id).unwrap().unwrap();
        assert_eq!(report.status, ReportStatus::Rejected);
        assert_eq!(report.rejected_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_list_reports_by_status() {
        let db = Database::in_memory().unwrap();
        let a = db.create_report("abc", None, "one").unwrap();
        db.create_report("def", None, "two").unwrap();
        db.resolve_report(a, "admin", None).unwrap();

        let pending = db.list_reports(Some(ReportStatus::Pending)).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reason, "two");

        let all = db.list_reports(None).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_preferences_round_trip() {
        let db = Database::in_memory().unwrap();
        assert!(db.get_preferences("u1").unwrap().is_none());

        let prefs = UserPreferences {
            tags: vec!["stem".to_string()],
            min_duration_weeks: Some(6.0),
            stipend_required: true,
            ..Default::default()
        };
        db.set_preferences("u1", &prefs).unwrap();

        let loaded = db.get_preferences("u1").unwrap().unwrap();
        assert_eq!(loaded.tags, vec!["stem"]);
        assert_eq!(loaded.min_duration_weeks, Some(6.0));
        assert!(loaded.stipend_required);
    }

    #[test]
    fn test_eligibility_unknown_vs_false() {
        let db = Database::in_memory().unwrap();
        db.set_eligibility("u1", "abc", "gpa", true).unwrap();
        db.set_eligibility("u1", "abc", "age", false).unwrap();

        let items = db.get_eligibility("u1", "abc").unwrap();
        assert_eq!(items.get("gpa"), Some(&true));
        assert_eq!(items.get("age"), Some(&false));
        // Never recorded: absent from the map entirely.
        assert_eq!(items.get("essay"), None);

        let all = db.all_eligibility("u1").unwrap();
        assert_eq!(all.get("abc").unwrap().len(), 2);
    }
}
