//! Page sequence for the active criteria.
//!
//! The pager is sans-IO: [`CatalogPager::begin_fetch`] hands out a
//! [`PageTicket`] for the next offset and [`CatalogPager::complete_fetch`]
//! applies the result. The caller performs the request in between, possibly
//! while other events are processed. Every ticket carries the criteria
//! generation it was issued under, so a page that arrives after the criteria
//! changed is dropped instead of being mixed into the new sequence.
//!
//! A page is requested when:
//! - the user scrolls within `scroll_threshold` of the bottom, or
//! - fewer than `page_size` products are visible and the source has more.
//!
//! The second rule exists because filtering happens client-side: a full page
//! from the server may contribute only a few visible products.

use tracing::{debug, instrument};

use crate::api::{ApiError, Product, ProductListResponse};
use crate::catalog::criteria::FilterCriteria;
use crate::catalog::{CatalogSource, DEFAULT_PAGE_SIZE, DEFAULT_SCROLL_THRESHOLD, view};

/// One batch of products from a single paginated fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Product>,
    /// Offset this page was requested at.
    pub offset: u32,
    /// Offset of the page after this one.
    pub next_offset: u32,
    /// Whether the source reported products beyond this page.
    pub has_more: bool,
}

impl Page {
    /// Build a page from a listing response requested at `offset`.
    ///
    /// An empty page never reports more, so a misbehaving source cannot keep
    /// the pager fetching forever.
    #[must_use]
    pub fn from_listing(listing: ProductListResponse, offset: u32, limit: u32) -> Self {
        let count = u32::try_from(listing.products.len()).unwrap_or(u32::MAX);
        let next_offset = offset.saturating_add(count);
        let has_more = count > 0 && next_offset < listing.total;

        debug!(offset, limit, count, total = listing.total, has_more, "page received");

        Self {
            items: listing.products,
            offset,
            next_offset,
            has_more,
        }
    }
}

/// A reservation for one outstanding page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    offset: u32,
    limit: u32,
}

impl PageTicket {
    /// Offset (`skip`) to request.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Page size (`limit`) to request.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was appended to the current sequence.
    Applied { added: usize },
    /// The criteria changed while the request was outstanding; the page was
    /// discarded.
    Stale,
}

/// Pages fetched for the active [`FilterCriteria`].
#[derive(Debug, Clone)]
pub struct CatalogPager {
    page_size: u32,
    scroll_threshold: u32,
    criteria: FilterCriteria,
    generation: u64,
    pages: Vec<Page>,
    in_flight: Option<PageTicket>,
}

impl Default for CatalogPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, DEFAULT_SCROLL_THRESHOLD)
    }
}

impl CatalogPager {
    /// Create an empty pager. A zero page size is treated as one.
    #[must_use]
    pub fn new(page_size: u32, scroll_threshold: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            scroll_threshold,
            criteria: FilterCriteria::default(),
            generation: 0,
            pages: Vec::new(),
            in_flight: None,
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    #[must_use]
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Replace the criteria.
    ///
    /// Returns `true` if the criteria differed. In that case the page sequence
    /// is abandoned, any in-flight request is forgotten, and the next fetch
    /// starts again at offset 0.
    #[instrument(skip(self, criteria), fields(generation = self.generation))]
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> bool {
        if criteria == self.criteria {
            return false;
        }

        self.criteria = criteria;
        self.generation += 1;
        self.pages.clear();
        self.in_flight = None;
        debug!(generation = self.generation, "criteria changed, page sequence reset");
        true
    }

    /// Whether more pages are known (or, before the first fetch, assumed) to
    /// exist.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.pages.last().is_none_or(|page| page.has_more)
    }

    /// Whether a request is outstanding for the current criteria.
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Offset of the next page to request.
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        self.pages.last().map_or(0, |page| page.next_offset)
    }

    /// All fetched products, in fetch order.
    pub fn items(&self) -> impl Iterator<Item = &Product> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    /// Number of fetched products.
    #[must_use]
    pub fn fetched_count(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    /// The displayed list: fetched products filtered and sorted.
    #[must_use]
    pub fn visible(&self) -> Vec<Product> {
        view::apply(self.items(), &self.criteria)
    }

    /// Reserve the next page.
    ///
    /// Returns `None` while a request is outstanding or once the source is
    /// exhausted.
    pub fn begin_fetch(&mut self) -> Option<PageTicket> {
        if self.in_flight.is_some() || !self.has_more() {
            return None;
        }

        let ticket = PageTicket {
            generation: self.generation,
            offset: self.next_offset(),
            limit: self.page_size,
        };
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Apply the result of a ticketed request.
    ///
    /// Results for tickets issued under earlier criteria are discarded,
    /// including failures.
    ///
    /// # Errors
    ///
    /// Returns the fetch error for a current ticket. The in-flight marker is
    /// cleared so a later trigger may try again; nothing is retried here.
    pub fn complete_fetch(
        &mut self,
        ticket: PageTicket,
        result: Result<Page, ApiError>,
    ) -> Result<FetchOutcome, ApiError> {
        if ticket.generation != self.generation || self.in_flight != Some(ticket) {
            debug!(offset = ticket.offset, "discarding page for stale criteria");
            return Ok(FetchOutcome::Stale);
        }

        self.in_flight = None;
        let page = result?;
        let added = page.items.len();
        self.pages.push(page);
        Ok(FetchOutcome::Applied { added })
    }

    /// Scroll trigger: reserve the next page if the viewport is within the
    /// threshold of the bottom.
    pub fn on_scroll(&mut self, distance_from_bottom: u32) -> Option<PageTicket> {
        if distance_from_bottom > self.scroll_threshold {
            return None;
        }
        self.begin_fetch()
    }

    /// Whether fewer than a page of products is visible while more exist.
    #[must_use]
    pub fn needs_fill(&self) -> bool {
        !self.is_fetching() && self.has_more() && self.visible_count() < self.page_size_usize()
    }

    /// Fill trigger: reserve the next page if [`Self::needs_fill`] holds.
    pub fn fill_ticket(&mut self) -> Option<PageTicket> {
        if self.needs_fill() {
            self.begin_fetch()
        } else {
            None
        }
    }

    /// Fetch pages from `source` until a full page of products is visible or
    /// the source is exhausted. Returns the number of pages fetched.
    ///
    /// # Errors
    ///
    /// Stops at the first failed fetch and returns its error.
    pub async fn fill<S>(&mut self, source: &S) -> Result<usize, ApiError>
    where
        S: CatalogSource + ?Sized,
    {
        let mut fetched = 0;
        while let Some(ticket) = self.fill_ticket() {
            let result = source.fetch_page(ticket.limit, ticket.offset).await;
            if let FetchOutcome::Applied { .. } = self.complete_fetch(ticket, result)? {
                fetched += 1;
            }
        }
        Ok(fetched)
    }

    /// Fetch exactly one more page, if one can be requested.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn fetch_next<S>(&mut self, source: &S) -> Result<Option<FetchOutcome>, ApiError>
    where
        S: CatalogSource + ?Sized,
    {
        let Some(ticket) = self.begin_fetch() else {
            return Ok(None);
        };
        let result = source.fetch_page(ticket.limit, ticket.offset).await;
        self.complete_fetch(ticket, result).map(Some)
    }

    fn visible_count(&self) -> usize {
        if self.criteria.is_active() {
            self.visible().len()
        } else {
            self.fetched_count()
        }
    }

    fn page_size_usize(&self) -> usize {
        usize::try_from(self.page_size).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use dummymart_core::ProductId;

    use super::*;
    use crate::api::ProductInfo;
    use crate::catalog::criteria::SortKey;

    /// In-memory catalog recording every request.
    struct FakeSource {
        products: Vec<Product>,
        requests: Mutex<Vec<(u32, u32)>>,
        fail: bool,
    }

    impl FakeSource {
        fn new(products: Vec<Product>) -> Self {
            Self {
                products,
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn requests(&self) -> Vec<(u32, u32)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        async fn fetch_page(&self, limit: u32, skip: u32) -> Result<Page, ApiError> {
            self.requests.lock().unwrap().push((limit, skip));
            if self.fail {
                return Err(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            let products = self
                .products
                .iter()
                .skip(skip as usize)
                .take(limit as usize)
                .cloned()
                .collect();
            let listing = ProductListResponse {
                products,
                total: u32::try_from(self.products.len()).unwrap(),
                skip,
                limit,
            };
            Ok(Page::from_listing(listing, skip, limit))
        }
    }

    fn product(id: i32, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: String::new(),
            category: category.to_string(),
            price: Decimal::new(i64::from(id) * 100, 2),
            discount_percentage: Decimal::ZERO,
            rating: 4.0,
            stock: 5,
            brand: None,
            thumbnail: None,
            images: Vec::new(),
            info: ProductInfo::default(),
        }
    }

    /// `count` products where ids divisible by 7 are "laptops" (3 per 20).
    fn catalog(count: i32) -> Vec<Product> {
        (1..=count)
            .map(|id| product(id, if id % 7 == 0 { "laptops" } else { "groceries" }))
            .collect()
    }

    fn listing(ids: std::ops::RangeInclusive<i32>, total: u32) -> ProductListResponse {
        ProductListResponse {
            products: ids.map(|id| product(id, "groceries")).collect(),
            total,
            skip: 0,
            limit: 0,
        }
    }

    #[test]
    fn test_page_has_more_until_total() {
        let page = Page::from_listing(listing(1..=20, 45), 0, 20);
        assert_eq!(page.next_offset, 20);
        assert!(page.has_more);

        let last = Page::from_listing(listing(41..=45, 45), 40, 20);
        assert_eq!(last.next_offset, 45);
        assert!(!last.has_more);
    }

    #[test]
    fn test_empty_page_ends_sequence() {
        let page = Page::from_listing(listing(1..=0, 100), 60, 20);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_initial_fill_loads_one_page() {
        let source = FakeSource::new(catalog(100));
        let mut pager = CatalogPager::new(20, 300);

        assert!(pager.needs_fill());
        let fetched = pager.fill(&source).await.unwrap();

        assert_eq!(fetched, 1);
        assert_eq!(pager.visible().len(), 20);
        assert_eq!(source.requests(), vec![(20, 0)]);
        assert!(!pager.needs_fill());
    }

    #[tokio::test]
    async fn test_filter_keeps_fetching_until_page_is_full() {
        let source = FakeSource::new(catalog(200));
        let mut pager = CatalogPager::new(20, 300);
        pager.fill(&source).await.unwrap();

        pager.set_criteria(FilterCriteria::default().with_categories(["laptops"]));
        // The first page for the new criteria holds only two laptops (7, 14)...
        pager.fetch_next(&source).await.unwrap();
        assert_eq!(pager.visible().len(), 2);
        assert!(pager.needs_fill());

        // ...so filling continues until 20 laptops are visible.
        pager.fill(&source).await.unwrap();
        let visible = pager.visible();
        assert!(visible.len() >= 20);
        assert!(visible.iter().all(|p| p.category == "laptops"));
        // 140 products hold exactly 20 multiples of 7
        assert_eq!(pager.fetched_count(), 140);
    }

    #[tokio::test]
    async fn test_three_matches_in_first_page() {
        let mut products = catalog(20);
        for (i, product) in products.iter_mut().enumerate() {
            product.category = if i < 3 { "laptops" } else { "groceries" }.to_string();
        }
        products.extend((21..=60).map(|id| product(id, "groceries")));
        let source = FakeSource::new(products);

        let mut pager = CatalogPager::new(20, 300);
        pager.set_criteria(FilterCriteria::default().with_categories(["laptops"]));
        pager.fetch_next(&source).await.unwrap();
        assert_eq!(pager.visible().len(), 3);
        assert!(pager.needs_fill());

        // No further laptops exist: filling stops when the source is exhausted.
        pager.fill(&source).await.unwrap();
        assert_eq!(pager.visible().len(), 3);
        assert!(!pager.has_more());
        assert_eq!(source.requests(), vec![(20, 0), (20, 20), (20, 40)]);
    }

    #[test]
    fn test_stale_page_is_discarded() {
        let mut pager = CatalogPager::new(20, 300);
        let ticket = pager.begin_fetch().unwrap();

        pager.set_criteria(FilterCriteria::default().with_search("phone"));
        let outcome = pager
            .complete_fetch(ticket, Ok(Page::from_listing(listing(1..=20, 100), 0, 20)))
            .unwrap();

        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(pager.pages().is_empty());
        assert!(!pager.is_fetching());
        assert_eq!(pager.begin_fetch().unwrap().offset(), 0);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut pager = CatalogPager::new(20, 300);
        let ticket = pager.begin_fetch().unwrap();
        pager.set_criteria(FilterCriteria::default().with_sort(Some(SortKey::PriceAsc)));

        let outcome = pager.complete_fetch(ticket, Err(ApiError::RateLimited(1)));
        assert!(matches!(outcome, Ok(FetchOutcome::Stale)));
    }

    #[test]
    fn test_scroll_suppressed_while_fetching() {
        let mut pager = CatalogPager::new(20, 300);
        let ticket = pager.begin_fetch().unwrap();

        assert!(pager.on_scroll(0).is_none());
        assert!(pager.fill_ticket().is_none());

        pager
            .complete_fetch(ticket, Ok(Page::from_listing(listing(1..=20, 100), 0, 20)))
            .unwrap();
        let next = pager.on_scroll(120).unwrap();
        assert_eq!(next.offset(), 20);
    }

    #[test]
    fn test_scroll_outside_threshold_does_nothing() {
        let mut pager = CatalogPager::new(20, 300);
        assert!(pager.on_scroll(301).is_none());
        assert!(!pager.is_fetching());
        assert!(pager.on_scroll(300).is_some());
    }

    #[test]
    fn test_unchanged_criteria_keeps_pages() {
        let mut pager = CatalogPager::new(20, 300);
        let ticket = pager.begin_fetch().unwrap();
        pager
            .complete_fetch(ticket, Ok(Page::from_listing(listing(1..=20, 100), 0, 20)))
            .unwrap();

        assert!(!pager.set_criteria(FilterCriteria::default()));
        assert_eq!(pager.fetched_count(), 20);
        assert!(pager.set_criteria(FilterCriteria::default().with_search("1")));
        assert_eq!(pager.fetched_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_allows_retry() {
        let mut source = FakeSource::new(catalog(40));
        source.fail = true;
        let mut pager = CatalogPager::new(20, 300);

        let err = pager.fill(&source).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 503, .. }));
        assert!(!pager.is_fetching());
        assert_eq!(source.requests().len(), 1);

        source.fail = false;
        pager.fill(&source).await.unwrap();
        assert_eq!(pager.fetched_count(), 20);
    }

    #[tokio::test]
    async fn test_exhausted_source_stops_scroll_fetches() {
        let source = FakeSource::new(catalog(30));
        let mut pager = CatalogPager::new(20, 300);
        pager.fill(&source).await.unwrap();
        pager.fetch_next(&source).await.unwrap();

        assert_eq!(pager.fetched_count(), 30);
        assert!(!pager.has_more());
        assert!(pager.on_scroll(0).is_none());
        assert_eq!(pager.fetch_next(&source).await.unwrap(), None);
    }
}
