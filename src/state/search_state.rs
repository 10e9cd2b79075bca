/// Series search states
///
/// This module defines the states a series resolution moves through while
/// looking for the catalog series that matches a query.
use crate::CatalogError;
use std::fmt;

/// Represents the current state of a series resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    // ===== Active States =====
    /// Explicit catalog series ids were supplied; they are fetched directly
    Direct,

    /// Candidates on this search results page (1-based) are being tested
    SearchPage(u32),

    // ===== Terminal States =====
    /// At least one series was found
    Matched,

    /// The search ran out of results without a match
    NotFound,
}

impl SearchState {
    /// Returns the starting state for a resolution
    pub fn initial(has_explicit_ids: bool) -> Self {
        if has_explicit_ids {
            Self::Direct
        } else {
            Self::SearchPage(1)
        }
    }

    /// Returns true if this is a terminal state (no further pages are fetched)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Matched | Self::NotFound)
    }

    /// Returns the search page number, if this state is searching
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::SearchPage(page) => Some(*page),
            _ => None,
        }
    }

    /// Returns true if moving from `self` to `to` is allowed
    ///
    /// | From | To |
    /// |------|----|
    /// | Direct | Matched, NotFound |
    /// | SearchPage(n) | Matched, SearchPage(n + 1), NotFound |
    pub fn can_transition(&self, to: SearchState) -> bool {
        match (self, to) {
            (Self::Direct, Self::Matched | Self::NotFound) => true,
            (Self::SearchPage(_), Self::Matched | Self::NotFound) => true,
            (Self::SearchPage(n), Self::SearchPage(m)) => m == n + 1,
            _ => false,
        }
    }

    /// Moves to `to`, rejecting transitions the search never makes
    pub fn transition(self, to: SearchState) -> Result<SearchState, CatalogError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(CatalogError::InvalidTransition { from: self, to })
        }
    }

    /// Short label used in log output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::SearchPage(_) => "search_page",
            Self::Matched => "matched",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SearchPage(page) => write!(f, "{}({})", self.label(), page),
            _ => write!(f, "{}", self.label()),
        }
    }
}
