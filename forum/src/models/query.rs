use std::{convert::Infallible, fmt, str::FromStr};

/// Searches shorter than this (after trimming) are not sent to the server.
pub const MIN_SEARCH_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Category {
    #[default]
    All,
    Named(String),
}

impl Category {
    /// The server-side filter value, `None` when unfiltered.
    pub fn name(&self) -> Option<&str> {
        match self {
            Category::All => None,
            Category::Named(name) => Some(name),
        }
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Category::All)
        } else {
            Ok(Category::Named(s.to_string()))
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::All => write!(f, "All"),
            Category::Named(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Nothing but whitespace in the search box.
    Cleared,
    BelowMinimum,
    Active,
}

/// What the user is currently asking the feed to show.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryState {
    pub search_text: String,
    pub category: Category,
}

impl QueryState {
    pub fn search_term(&self) -> &str {
        self.search_text.trim()
    }

    pub fn search_mode(&self) -> SearchMode {
        match self.search_term().chars().count() {
            0 => SearchMode::Cleared,
            n if n < MIN_SEARCH_LEN => SearchMode::BelowMinimum,
            _ => SearchMode::Active,
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q={:?} category={}", self.search_term(), self.category)
    }
}
