//! Agent-facing text rendering of merchant responses.

use std::fmt::Write as _;

use serde_json::Value;

use crate::{catalog::ProductSearchResult, models::Checkout};

/// Formats an amount in minor units as `$x.yy`.
///
/// # Examples
///
/// ```
/// use ucp_toolkit::format::format_price;
///
/// assert_eq!(format_price(1234), "$12.34");
/// assert_eq!(format_price(5), "$0.05");
/// ```
#[must_use]
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", abs / 100, abs % 100)
}

/// Upper-cases the first letter of each `_`, `-` or space separated word.
#[must_use]
pub fn title_case(input: &str) -> String {
    input
        .split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders catalog search results.
#[must_use]
pub fn format_search_results(result: &ProductSearchResult) -> String {
    if result.products.is_empty() {
        return format!("No products found for '{}'.", result.query);
    }

    let mut out = format!("Found {} product(s) for '{}':\n", result.total, result.query);
    for product in &result.products {
        let _ = write!(out, "\n  - **{}** (Product ID: `{}`)", product.title, product.id);
    }
    out
}

/// Renders a checkout as a markdown summary.
#[must_use]
pub fn format_checkout_summary(checkout: &Checkout) -> String {
    let mut lines = vec![
        format!("**Checkout ID:** {}", checkout.id()),
        format!("**Status:** {}", checkout.status()),
        format!("**Currency:** {}", checkout.currency().unwrap_or("N/A")),
    ];

    let items = checkout.line_items();
    if !items.is_empty() {
        lines.push("\n**Items in Cart:**".to_owned());
        for item in items {
            lines.push(format!(
                "  - {} x{} @ {} each",
                item.title.unwrap_or(item.item_id),
                item.quantity,
                format_price(item.price)
            ));
        }
    }

    let totals = checkout.totals();
    if !totals.is_empty() {
        lines.push("\n**Totals:**".to_owned());
        for total in totals {
            let label = total.display_text.map_or_else(|| title_case(total.kind), str::to_owned);
            lines.push(format!("  - {label}: {}", format_price(total.amount)));
        }
    }

    if let Some(order_id) = checkout.order_id() {
        lines.push("\n**Order Confirmed!**".to_owned());
        lines.push(format!("  - Order ID: {order_id}"));
        if let Some(url) = checkout.order_permalink() {
            lines.push(format!("  - Order URL: {url}"));
        }
    }

    lines.join("\n")
}

/// Renders a merchant order as a markdown summary.
///
/// Line quantities may be a number or an object with a `total` field.
#[must_use]
pub fn format_order_summary(order: &Value) -> String {
    let text = |value: Option<&Value>| value.and_then(Value::as_str).unwrap_or("N/A").to_owned();

    let mut lines = vec![
        format!("**Order ID:** {}", text(order.get("id"))),
        format!("**Checkout ID:** {}", text(order.get("checkout_id"))),
    ];

    if let Some(items) = order.get("line_items").and_then(Value::as_array)
        && !items.is_empty()
    {
        lines.push("\n**Items:**".to_owned());
        for item in items {
            let title = item.pointer("/item/title").and_then(Value::as_str).unwrap_or("Unknown");
            let quantity = match item.get("quantity") {
                Some(Value::Object(q)) => q.get("total").and_then(Value::as_u64).unwrap_or(0),
                Some(q) => q.as_u64().unwrap_or(0),
                None => 0,
            };
            let status = item.get("status").and_then(Value::as_str).unwrap_or("unknown");
            lines.push(format!("  - {title} x{quantity} - Status: {status}"));
        }
    }

    if let Some(totals) = order.get("totals").and_then(Value::as_array)
        && !totals.is_empty()
    {
        lines.push("\n**Totals:**".to_owned());
        for total in totals {
            let kind = total.get("type").and_then(Value::as_str).unwrap_or_default();
            let amount = total.get("amount").and_then(Value::as_i64).unwrap_or(0);
            lines.push(format!("  - {}: {}", title_case(kind), format_price(amount)));
        }
    }

    lines.join("\n")
}
