//! Filter value objects and the cache key derived from them.
//!
//! [`FilterState`] is always fully defined: every field has a canonical
//! default, and the field types make partially-set or out-of-schema states
//! unrepresentable. [`QueryKey`] is the structural identity of one cached
//! result sequence.

use super::error::{Result, StorefrontError};
use std::fmt;

/// Category facet. The unnamed category maps to the unfiltered upstream
/// endpoint.
///
/// Only [`Category::parse`] and [`Category::all`] build a value, so a named
/// category is never empty and never spelled `"all"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Category(Option<String>);

impl Category {
    /// The unfiltered category; also the default.
    #[must_use]
    pub const fn all() -> Self {
        Self(None)
    }

    /// Builds a category from a user or URL value.
    ///
    /// The empty string and `"all"` both mean [`Category::all`], so a named
    /// category can never collide with the default.
    ///
    /// ```
    /// use storefront::domain::Category;
    ///
    /// assert_eq!(Category::parse(""), Category::all());
    /// assert_eq!(Category::parse("all"), Category::all());
    /// assert_eq!(Category::parse("jewelery").name(), Some("jewelery"));
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "" | "all" => Self(None),
            other => Self(Some(other.to_string())),
        }
    }

    #[must_use]
    pub const fn is_all(&self) -> bool {
        self.0.is_none()
    }

    /// The category name, `None` for the unfiltered category. This is also
    /// the category argument handed to the upstream fetch.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.name().unwrap_or("all")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price ordering delegated to the upstream fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parses the URL representation; anything but `asc`/`desc` is `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum whole-star rating, `0..=5`. Zero disables the rating filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RatingThreshold(u8);

impl RatingThreshold {
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns [`StorefrontError::InvalidFilter`] for values above 5.
    pub fn new(value: u8) -> Result<Self> {
        if value > Self::MAX {
            return Err(StorefrontError::InvalidFilter(format!(
                "rating threshold {value} is outside 0..={}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_active(self) -> bool {
        self.0 > 0
    }
}

/// The complete set of user-selected filters.
///
/// `FilterState::default()` is the canonical reset state:
/// `{category: all, sort: asc, search: "", rating: 0}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    pub category: Category,
    pub sort_order: SortOrder,
    pub search_text: String,
    pub rating_threshold: RatingThreshold,
}

impl FilterState {
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Derives the cache key for this state.
    #[must_use]
    pub fn query_key(&self) -> QueryKey {
        QueryKey::from(self)
    }
}

/// Identity of one cached result sequence.
///
/// Two filter states with equal keys share a cache entry; equality is by
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub category: Category,
    pub sort_order: SortOrder,
    pub search_text: String,
    pub rating_threshold: RatingThreshold,
}

impl From<&FilterState> for QueryKey {
    fn from(state: &FilterState) -> Self {
        Self {
            category: state.category.clone(),
            sort_order: state.sort_order,
            search_text: state.search_text.clone(),
            rating_threshold: state.rating_threshold,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{:?}/{}",
            self.category,
            self.sort_order,
            self.search_text,
            self.rating_threshold.get()
        )
    }
}
