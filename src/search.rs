//! Search history and suggestions

use crate::config::DEFAULT_RECENT_SEARCH_LIMIT;

/// Suggestions offered for one query.
pub const MAX_SUGGESTIONS: usize = 5;

/// Recently submitted search terms, most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSearches {
    terms: Vec<String>,
    limit: usize,
}

impl Default for RecentSearches {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_SEARCH_LIMIT)
    }
}

impl RecentSearches {
    /// Empty history keeping at most `limit` terms.
    pub fn new(limit: usize) -> Self {
        Self {
            terms: Vec::new(),
            limit,
        }
    }

    /// History from stored terms, trimmed to `limit`.
    pub fn restore(terms: Vec<String>, limit: usize) -> Self {
        let mut history = Self::new(limit);

        for term in terms.into_iter().rev() {
            history.record(&term);
        }

        history
    }

    /// Remember a term. Blank queries are ignored; a repeated term moves to the front.
    ///
    /// Returns whether the term was recorded.
    pub fn record(&mut self, query: &str) -> bool {
        let term = query.trim();

        if term.is_empty() || self.limit == 0 {
            return false;
        }

        self.terms.retain(|existing| existing != term);
        self.terms.insert(0, term.to_string());
        self.terms.truncate(self.limit);

        true
    }

    /// Forget one term.
    pub fn remove(&mut self, term: &str) -> bool {
        let before = self.terms.len();
        self.terms.retain(|existing| existing != term);

        self.terms.len() != before
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.terms.clear();
    }

    /// Terms, most recent first.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Popular terms containing the query, case-insensitively. A blank query gets no suggestions.
pub fn suggestions<'a>(query: &str, popular: &'a [String]) -> Vec<&'a str> {
    let needle = query.trim().to_lowercase();

    if needle.is_empty() {
        return Vec::new();
    }

    popular
        .iter()
        .filter(|term| term.to_lowercase().contains(&needle))
        .map(String::as_str)
        .take(MAX_SUGGESTIONS)
        .collect()
}
