//! Shareable links to the hosted listing page.

pub const INTERNSHIPS_BASE_URL: &str = "https://www.internyl.org/pages/internships/";
// Local dev server alternative:
// pub const INTERNSHIPS_BASE_URL: &str = "http://127.0.0.1:5500/pages/internships/";

/// Full externally-navigable URL for one internship's anchor fragment.
pub fn compose_share_link(anchor: &str) -> String {
    format!("{}#{}", INTERNSHIPS_BASE_URL, anchor)
}

/// Compose the share link and write it to the system clipboard.
///
/// Fire-and-forget: a failed clipboard write is logged at debug and otherwise
/// invisible to the caller. Callers that need confirmation must hold the
/// composed link themselves (see `compose_share_link`).
pub fn copy_share_link(anchor: &str) {
    let link = compose_share_link(anchor);
    let result = arboard::Clipboard::new().and_then(|mut cb| cb.set_text(link));
    if let Err(e) = result {
        log::debug!("clipboard write failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_share_link() {
        assert_eq!(
            compose_share_link("abc123"),
            "https://www.internyl.org/pages/internships/#abc123"
        );
    }

    #[test]
    fn test_compose_share_link_keeps_fragment_verbatim() {
        // The anchor is a fragment, not a query value; it is not encoded.
        assert_eq!(
            compose_share_link("summer-2027"),
            "https://www.internyl.org/pages/internships/#summer-2027"
        );
    }
}
