//! Client-side filter and sort over fetched products.

use std::cmp::Ordering;

use crate::api::Product;
use crate::catalog::criteria::{FilterCriteria, SortKey};

/// Filter and sort `items` by `criteria`.
///
/// Steps run in a fixed order: title search, category membership, inclusive
/// price range, then a stable sort. Items that compare equal keep their fetch
/// order, so identical inputs always produce identical output.
pub fn apply<'a, I>(items: I, criteria: &FilterCriteria) -> Vec<Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    let needle = criteria.search_needle();

    let mut visible: Vec<Product> = items
        .into_iter()
        .filter(|product| {
            needle
                .as_deref()
                .is_none_or(|needle| product.title.to_lowercase().contains(needle))
        })
        .filter(|product| {
            criteria.categories.is_empty() || criteria.categories.contains(&product.category)
        })
        .filter(|product| {
            criteria
                .price_range
                .is_none_or(|range| range.contains(product.price))
        })
        .cloned()
        .collect();

    if let Some(key) = criteria.sort {
        // slice::sort_by is stable
        visible.sort_by(|a, b| compare(a, b, key));
    }

    visible
}

fn compare(a: &Product, b: &Product, key: SortKey) -> Ordering {
    match key {
        SortKey::PriceAsc => a.price.cmp(&b.price),
        SortKey::PriceDesc => b.price.cmp(&a.price),
        SortKey::RatingAsc => a.rating.total_cmp(&b.rating),
        SortKey::RatingDesc => b.rating.total_cmp(&a.rating),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use dummymart_core::ProductId;

    use super::*;
    use crate::api::ProductInfo;
    use crate::catalog::criteria::PriceRange;

    fn product(id: i32, title: &str, category: &str, cents: i64, rating: f64) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: String::new(),
            category: category.to_string(),
            price: Decimal::new(cents, 2),
            discount_percentage: Decimal::ZERO,
            rating,
            stock: 10,
            brand: None,
            thumbnail: None,
            images: Vec::new(),
            info: ProductInfo::default(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "Essence Mascara", "beauty", 999, 4.9),
            product(2, "Eyeshadow Palette", "beauty", 1999, 3.3),
            product(3, "Calvin Klein CK One", "fragrances", 4999, 4.8),
            product(4, "Annibale Colombo Bed", "furniture", 189_999, 4.1),
            product(5, "Red Lipstick", "beauty", 1299, 3.3),
            product(6, "Wooden Bathroom Sink", "furniture", 79_999, 3.3),
        ]
    }

    fn ids(products: &[Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_no_criteria_keeps_fetch_order() {
        let items = catalog();
        assert_eq!(ids(&apply(&items, &FilterCriteria::default())), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let items = catalog();
        let criteria = FilterCriteria::default().with_search("  PALETTE ");
        assert_eq!(ids(&apply(&items, &criteria)), vec![2]);

        let criteria = FilterCriteria::default().with_search("o");
        assert_eq!(ids(&apply(&items, &criteria)), vec![2, 3, 4, 6]);
    }

    #[test]
    fn test_category_filter() {
        let items = catalog();
        let criteria = FilterCriteria::default().with_categories(["furniture", "fragrances"]);
        assert_eq!(ids(&apply(&items, &criteria)), vec![3, 4, 6]);
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let items = catalog();
        let range = PriceRange::new(Decimal::new(1299, 2), Decimal::new(4999, 2)).unwrap();
        let criteria = FilterCriteria::default().with_price_range(Some(range));
        assert_eq!(ids(&apply(&items, &criteria)), vec![2, 3, 5]);
    }

    #[test]
    fn test_sort_ties_keep_fetch_order() {
        let items = catalog();
        let criteria = FilterCriteria::default().with_sort(Some(SortKey::RatingAsc));
        // 2, 5 and 6 share a 3.3 rating
        assert_eq!(ids(&apply(&items, &criteria)), vec![2, 5, 6, 4, 3, 1]);

        let criteria = FilterCriteria::default().with_sort(Some(SortKey::RatingDesc));
        assert_eq!(ids(&apply(&items, &criteria)), vec![1, 3, 4, 2, 5, 6]);
    }

    #[test]
    fn test_price_desc_reverses_price_asc_for_distinct_prices() {
        let items = catalog();
        let asc = apply(&items, &FilterCriteria::default().with_sort(Some(SortKey::PriceAsc)));
        let desc = apply(&items, &FilterCriteria::default().with_sort(Some(SortKey::PriceDesc)));

        let mut reversed = ids(&asc);
        reversed.reverse();
        assert_eq!(ids(&desc), reversed);
        assert_eq!(ids(&asc), vec![1, 5, 2, 3, 6, 4]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let items = catalog();
        let range = PriceRange::new(Decimal::ZERO, Decimal::new(100_000, 2)).unwrap();
        let criterias = [
            FilterCriteria::default(),
            FilterCriteria::default().with_search("e"),
            FilterCriteria::default()
                .with_categories(["beauty"])
                .with_sort(Some(SortKey::PriceDesc)),
            FilterCriteria::default()
                .with_price_range(Some(range))
                .with_sort(Some(SortKey::RatingAsc)),
        ];

        for criteria in &criterias {
            let once = apply(&items, criteria);
            let twice = apply(&once, criteria);
            assert_eq!(once, twice, "not idempotent for {criteria:?}");
        }
    }

    #[test]
    fn test_filters_compose() {
        let items = catalog();
        let criteria = FilterCriteria::default()
            .with_search("e")
            .with_categories(["beauty"])
            .with_sort(Some(SortKey::PriceDesc));
        assert_eq!(ids(&apply(&items, &criteria)), vec![2, 5, 1]);
    }
}
