//! Filter and sort criteria.
//!
//! [`FilterCriteria`] is a value type: changes produce a new value through the
//! `with_*` methods and the pager compares whole values to decide whether its
//! pages are still valid.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Requested ordering of the displayed products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    RatingAsc,
    RatingDesc,
}

impl SortKey {
    /// Every sort key, in menu order.
    pub const ALL: [Self; 4] = [
        Self::PriceAsc,
        Self::PriceDesc,
        Self::RatingAsc,
        Self::RatingDesc,
    ];

    /// Stable identifier (`price-asc`, ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::RatingAsc => "rating-asc",
            Self::RatingDesc => "rating-desc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized sort key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key '{0}' (expected price-asc, price-desc, rating-asc or rating-desc)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

/// An inclusive price range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceRange {
    min: Decimal,
    max: Decimal,
}

/// Error for a range whose bounds are reversed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("minimum price {min} is greater than maximum price {max}")]
pub struct InvalidPriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// Create a range; `min` must not exceed `max`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPriceRange`] when `min > max`.
    pub fn new(min: Decimal, max: Decimal) -> Result<Self, InvalidPriceRange> {
        if min > max {
            return Err(InvalidPriceRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub const fn min(&self) -> Decimal {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Decimal {
        self.max
    }

    /// Inclusive membership test.
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.min <= price && price <= self.max
    }
}

/// The combined search/category/price/sort selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterCriteria {
    /// Case-insensitive title substring; blank means no filter.
    pub search_text: String,
    /// Allowed categories; empty means no filter.
    pub categories: BTreeSet<String>,
    /// Inclusive price bounds; `None` means no filter.
    pub price_range: Option<PriceRange>,
    /// Ordering; `None` keeps fetch order.
    pub sort: Option<SortKey>,
}

impl FilterCriteria {
    /// Whether any filter or sort is applied.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.search_text.trim().is_empty()
            || !self.categories.is_empty()
            || self.price_range.is_some()
            || self.sort.is_some()
    }

    /// The search text as matched: trimmed and lowercased.
    #[must_use]
    pub fn search_needle(&self) -> Option<String> {
        let trimmed = self.search_text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
    }

    #[must_use]
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Add the category if absent, remove it if present.
    #[must_use]
    pub fn with_category_toggled(mut self, category: &str) -> Self {
        if !self.categories.remove(category) {
            self.categories.insert(category.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_price_range(mut self, range: Option<PriceRange>) -> Self {
        self.price_range = range;
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }
}
