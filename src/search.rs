//! The listing page's search box: an editable query string initialized from
//! the current `search` query parameter, plus URL construction for it.

use crate::share::INTERNSHIPS_BASE_URL;

/// Listing URL carrying the `search` query parameter, percent-encoded.
pub fn listing_search_url(query: &str) -> String {
    format!("{}?search={}", INTERNSHIPS_BASE_URL, urlencoding::encode(query))
}

#[derive(Debug, Clone, Default)]
pub struct SearchBox {
    query: String,
}

impl SearchBox {
    /// Start from the current `search` parameter, or empty when absent.
    pub fn new(current_param: Option<&str>) -> Self {
        Self {
            query: current_param.unwrap_or_default().to_string(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, q: &str) {
        self.query = q.to_string();
    }

    /// Returns the navigation target on submit, or None when no navigation
    /// happens.
    ///
    /// Navigation fires only when the trimmed query is blank, carrying the
    /// empty `search` parameter. That is what the live site's submit handler
    /// does, inverted as it looks; changing it is a product call, so the
    /// behavior is kept as-is.
    pub fn submit(&self) -> Option<String> {
        if self.query.trim().is_empty() {
            Some(listing_search_url(""))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_search_url_encodes_query() {
        assert_eq!(
            listing_search_url("marine biology"),
            "https://www.internyl.org/pages/internships/?search=marine%20biology"
        );
        assert_eq!(
            listing_search_url(""),
            "https://www.internyl.org/pages/internships/?search="
        );
    }

    #[test]
    fn test_search_box_initializes_from_current_param() {
        let fresh = SearchBox::new(None);
        assert_eq!(fresh.query(), "");
        let carried = SearchBox::new(Some("robotics"));
        assert_eq!(carried.query(), "robotics");
    }

    #[test]
    fn test_submit_navigates_only_when_blank() {
        let blank = SearchBox::new(None);
        assert_eq!(
            blank.submit(),
            Some("https://www.internyl.org/pages/internships/?search=".to_string())
        );

        let whitespace = SearchBox::new(Some("   "));
        assert!(whitespace.submit().is_some());

        let mut filled = SearchBox::new(None);
        filled.set_query("robotics");
        assert_eq!(filled.submit(), None);
    }
}
