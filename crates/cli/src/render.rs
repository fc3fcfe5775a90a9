//! Plain-text rendering of products and the cart.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use dummymart_core::Email;
use dummymart_storefront::api::{Product, ProductInfo};
use dummymart_storefront::cart::CartStore;
use dummymart_storefront::models::session::Session;

pub const CONTACT_SENT: &str = "Message sent. We'll get back to you soon.";

const TITLE_WIDTH: usize = 38;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

fn stock_label(product: &Product) -> String {
    if product.in_stock() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    }
}

/// One line per product.
pub fn product_list(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products match.".to_string();
    }

    let mut out = String::new();
    for product in products {
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:>9}  {:.1}/5  {}",
            product.id,
            truncate(&product.title, TITLE_WIDTH),
            product.unit_price().to_string(),
            product.rating,
            stock_label(product),
            width = TITLE_WIDTH,
        );
    }
    out.trim_end().to_string()
}

/// Details view with related products underneath.
pub fn product_details(product: &Product, related: &[Product]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", product.title, product.id);
    if let Some(brand) = &product.brand {
        let _ = writeln!(out, "Brand: {brand}");
    }
    let _ = writeln!(out, "Category: {}", product.category);
    let _ = writeln!(
        out,
        "Price: {}  ({}% off)",
        product.unit_price(),
        product.discount_percentage.round_dp(2)
    );
    let _ = writeln!(out, "Rating: {:.1}/5  {}", product.rating, stock_label(product));
    if !product.description.is_empty() {
        let _ = writeln!(out, "\n{}", product.description);
    }
    specs(&mut out, product);
    policies(&mut out, &product.info);
    reviews(&mut out, &product.info);
    if !product.images.is_empty() {
        let _ = writeln!(out, "\nImages:");
        for image in &product.images {
            let _ = writeln!(out, "  {image}");
        }
    }
    if !related.is_empty() {
        let _ = writeln!(out, "\nRelated products:");
        out.push_str(&product_list(related));
    }
    out.trim_end().to_string()
}

fn specs(out: &mut String, product: &Product) {
    let _ = writeln!(out, "\nSpecs:");
    let _ = writeln!(out, "  Model:  #{}", product.id);
    if let Some(brand) = &product.brand {
        let _ = writeln!(out, "  Brand:  {brand}");
    }
    if let Some(size) = product.info.dimensions {
        let _ = writeln!(
            out,
            "  Size:   {} x {} x {} mm",
            size.width, size.height, size.depth
        );
    }
    if let Some(weight) = product.info.weight {
        let _ = writeln!(out, "  Weight: {weight} g");
    }
}

fn policies(out: &mut String, info: &ProductInfo) {
    let lines = [
        ("Refund policy", info.return_policy.clone()),
        ("Shipping", info.shipping_information.clone()),
        ("Warranty", info.warranty_information.clone()),
        ("Availability", info.availability_status.clone()),
        (
            "Min order",
            info.minimum_order_quantity.map(|n| n.to_string()),
        ),
    ];
    for (label, value) in lines {
        if let Some(value) = value {
            let _ = writeln!(out, "  - {label}: {value}");
        }
    }
}

fn reviews(out: &mut String, info: &ProductInfo) {
    let _ = writeln!(out, "\nReviews ({}):", info.reviews.len());
    if info.reviews.is_empty() {
        let _ = writeln!(out, "  No reviews available.");
    }
    for review in &info.reviews {
        let _ = write!(out, "  {}/5  {}", review.rating, review.reviewer_name);
        if let Some(date) = review.date {
            let _ = write!(out, "  {}", date.format("%Y-%m-%d"));
        }
        let _ = writeln!(out);
        if !review.comment.is_empty() {
            let _ = writeln!(out, "    {}", review.comment);
        }
    }
}

/// Who is logged in and how long the access token stays valid.
pub fn session(session: &Session, now: DateTime<Utc>) -> String {
    let email = session.email.as_ref().map_or("no email", Email::as_str);
    let remaining = (session.expires_at - now).num_minutes();
    let expiry = if session.is_expired(now) {
        "expired".to_string()
    } else if remaining < 1 {
        "less than a minute".to_string()
    } else {
        format!("{remaining} min")
    };
    format!(
        "{} ({email})\nToken expires in: {expiry} (at {})",
        session.display_name(),
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Cart lines and the price summary.
pub fn cart(cart: &CartStore) -> String {
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut out = String::new();
    for line in cart.lines() {
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:>3} x {:>9} = {:>10}",
            line.product.id,
            truncate(&line.product.title, TITLE_WIDTH),
            line.quantity,
            line.product.unit_price().to_string(),
            line.line_total().to_string(),
            width = TITLE_WIDTH,
        );
    }

    let summary = cart.summary();
    let _ = writeln!(out, "\nItems:    {}", cart.total_quantity());
    let _ = writeln!(out, "Subtotal: {}", summary.subtotal);
    let _ = writeln!(out, "VAT:      {}", summary.vat);
    let _ = writeln!(out, "Discount: -{}", summary.discount);
    let _ = write!(out, "Total:    {}", summary.total);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dummymart_core::ProductId;
    use dummymart_storefront::api::ProductInfo;
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i32, title: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_string(),
            description: "A fine thing.".to_string(),
            category: "groceries".to_string(),
            price: Decimal::new(1000, 2),
            discount_percentage: Decimal::new(1000, 2),
            rating: 4.25,
            stock,
            brand: None,
            thumbnail: None,
            images: Vec::new(),
            info: ProductInfo::default(),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
    }

    #[test]
    fn test_product_list() {
        let out = product_list(&[product(1, "Apple", 3), product(2, "Pear", 0)]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.first().unwrap().contains("$10.00"));
        assert!(lines.first().unwrap().contains("3 in stock"));
        assert!(lines.last().unwrap().contains("out of stock"));
        assert_eq!(product_list(&[]), "No products match.");
    }

    #[test]
    fn test_product_details_sections() {
        let mut detailed = product(5, "Lamp", 2);
        detailed.brand = Some("Lumen".to_string());
        detailed.info = serde_json::from_str(
            r#"{
                "dimensions": {"width": 10.5, "height": 20, "depth": 5},
                "weight": 4,
                "returnPolicy": "30 days return policy",
                "shippingInformation": "Ships in 2 weeks",
                "minimumOrderQuantity": 3,
                "reviews": [
                    {"rating": 5, "comment": "Bright!", "date": "2024-05-23T08:56:21.618Z",
                     "reviewerName": "Ada"},
                    {"rating": 2, "comment": "", "reviewerName": "Bob"}
                ]
            }"#,
        )
        .unwrap();

        let out = product_details(&detailed, &[product(6, "Shade", 1)]);
        assert!(out.contains("  Model:  #5"));
        assert!(out.contains("  Size:   10.5 x 20 x 5 mm"));
        assert!(out.contains("  Weight: 4 g"));
        assert!(out.contains("  - Refund policy: 30 days return policy"));
        assert!(out.contains("  - Shipping: Ships in 2 weeks"));
        assert!(out.contains("  - Min order: 3"));
        assert!(!out.contains("Warranty"));
        assert!(out.contains("Reviews (2):"));
        assert!(out.contains("  5/5  Ada  2024-05-23\n    Bright!"));
        assert!(out.contains("  2/5  Bob\n"));
        assert!(out.contains("Related products:"));

        let plain = product_details(&product(7, "Rock", 1), &[]);
        assert!(plain.contains("Reviews (0):\n  No reviews available."));
        assert!(!plain.contains("Size:"));
    }

    #[test]
    fn test_session_shows_token_expiry() {
        let response = serde_json::from_str(
            r#"{"id": 1, "username": "emilys", "email": "emily@example.com",
                "firstName": "Emily", "accessToken": "tok"}"#,
        )
        .unwrap();
        let login: DateTime<Utc> = "2026-03-01T12:00:00Z".parse().unwrap();
        let current = Session::from_login(response, login);

        let out = session(&current, login + chrono::Duration::minutes(5));
        assert_eq!(
            out,
            "Emily (emily@example.com)\nToken expires in: 25 min (at 2026-03-01 12:30 UTC)"
        );
        assert!(session(&current, login + chrono::Duration::hours(1)).contains("expired"));
    }

    #[test]
    fn test_cart_summary() {
        let mut store = CartStore::new();
        store.set_quantity(&product(1, "Apple", 5), 2).unwrap();

        let out = cart(&store);
        assert!(out.contains("Subtotal: $20.00"));
        assert!(out.contains("VAT:      $2.00"));
        assert!(out.contains("Discount: -$2.00"));
        assert!(out.contains("Total:    $20.00"));
        assert_eq!(cart(&CartStore::new()), "Your cart is empty.");
    }
}
