use std::fmt;

/// What a fetched page is expected to contain, which selects the extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageRole {
    /// Site root carrying the city list
    Root,

    /// Per-city listing of complex cards
    Listing,

    /// A single complex's own page
    Detail,

    /// Unknown structure: inspect for cards and follow every same-origin link
    Generic,
}

impl PageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Listing => "listing",
            Self::Detail => "detail",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for PageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
