use anyhow::{anyhow, Result};

/// The signed-in user, passed explicitly by callers. There is no ambient
/// auth global; a command that needs identity takes it as a parameter.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
}

/// Saved-set membership primitives. Both operations are idempotent set ops:
/// adding an id twice or removing an absent id is a no-op at the store.
pub trait SavedStore {
    fn add_saved(&self, user_id: &str, internship_id: &str) -> Result<()>;
    fn remove_saved(&self, user_id: &str, internship_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkAction {
    Added,
    Removed,
}

/// Flip bookmark membership for one internship.
///
/// The caller supplies the current state; this issues exactly one store
/// update (add when not bookmarked, remove when bookmarked) and mutates no
/// local state - the caller re-reads or updates its own view afterwards.
/// A missing session is a hard error, never a silent no-op.
pub fn toggle_bookmark(
    store: &dyn SavedStore,
    session: Option<&Session>,
    internship_id: &str,
    is_bookmarked: bool,
) -> Result<BookmarkAction> {
    let session = session.ok_or_else(|| {
        anyhow!("Not authenticated. Run 'internyl login <user>' first.")
    })?;

    if is_bookmarked {
        store.remove_saved(&session.user_id, internship_id)?;
        Ok(BookmarkAction::Removed)
    } else {
        store.add_saved(&session.user_id, internship_id)?;
        Ok(BookmarkAction::Added)
    }
}
