//! Reply templates and INR currency formatting.
//!
//! Prices are rendered the way the `en-IN` locale renders INR: the last
//! three integer digits form one group and the rest are grouped in pairs
//! (`150000` → `₹1,50,000.00`).

use crate::models::Product;

pub const GREETING_HELP: &str = "Hi! I can help you with product prices, stock availability, \
or finding products. Try \"price of terracotta vase\", \"is the blue mug in stock?\" or \
\"show me planters\".";

pub const SESSION_GREETING: &str =
    "Hello! I'm the store assistant. Ask me about prices, stock, or products.";

pub const DECLINE: &str = "I was not trained to answer this type of questions.";

pub const NOT_FOUND: &str = "Sorry, I couldn't find that item. Try including the product \
name, for example \"price of terracotta vase\".";

pub const NO_MATCHING_PRODUCTS: &str = "I couldn't find any matching products. Try different \
keywords or a broader term, like \"show me mugs\".";

pub const FAILURE: &str = "Sorry, something went wrong while checking the database.";

pub const SEARCH_HEADER: &str = "Here are some products I found:";

/// Most bullets shown in a search reply.
pub const MAX_LISTED: usize = 6;

const PRICE_NOT_SET: &str = "Price not set";
const NOT_AVAILABLE: &str = "N/A";

/// Format an optional INR amount; `None` renders as `N/A`.
pub fn format_inr(amount: Option<f64>) -> String {
    match amount {
        Some(value) => format_inr_amount(value),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Format an INR amount with `en-IN` grouping and two decimals.
///
/// Rounding is half-up on the shortest decimal form of `value`, so `1.005`
/// renders as `₹1.01` even though the nearest `f64` is slightly below it.
/// Values that cannot be grouped (NaN, infinities, magnitudes too large to
/// count in paise) fall back to `₹{value}`.
pub fn format_inr_amount(value: f64) -> String {
    match group_en_in(value) {
        Some(formatted) => formatted,
        None => format!("₹{}", value),
    }
}

/// `|value|` in paise, rounded half-up on its shortest decimal digits.
fn to_paise(value: f64) -> Option<u128> {
    if !value.is_finite() {
        return None;
    }
    let repr = value.abs().to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let rupees: u128 = whole.parse().ok()?;

    let mut digits = fraction.bytes().map(|b| u128::from(b - b'0'));
    let tenths = digits.next().unwrap_or(0);
    let hundredths = digits.next().unwrap_or(0);
    let round_up = digits.next().is_some_and(|d| d >= 5);

    rupees
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths + u128::from(round_up))
}

fn group_en_in(value: f64) -> Option<String> {
    let paise = to_paise(value)?;
    let (rupees, fraction) = (paise / 100, paise % 100);
    let digits = rupees.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut pairs: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            pairs.push(&head[start..end]);
            end = start;
        }
        pairs.reverse();
        format!("{},{}", pairs.join(","), tail)
    };
    let sign = if value < 0.0 && paise > 0 { "-" } else { "" };
    Some(format!("{sign}₹{grouped}.{fraction:02}"))
}

fn stock_phrase(product: &Product) -> String {
    if product.in_stock() {
        format!("{} in stock", product.stock_count())
    } else {
        "out of stock".to_string()
    }
}

/// One bullet per candidate (at most [`MAX_LISTED`]), under [`SEARCH_HEADER`].
pub fn search_list(products: &[Product]) -> String {
    let mut lines = vec![SEARCH_HEADER.to_string()];
    lines.extend(products.iter().take(MAX_LISTED).map(|p| {
        format!(
            "• {} — {} — {}",
            p.name,
            format_inr(p.price_inr),
            stock_phrase(p)
        )
    }));
    lines.join("\n")
}

/// `"{name} costs {price}. SKU: {sku}."`
pub fn price_line(product: &Product) -> String {
    let price = match product.price_inr {
        Some(v) => format_inr_amount(v),
        None => PRICE_NOT_SET.to_string(),
    };
    let sku = product.sku.as_deref().unwrap_or(NOT_AVAILABLE);
    format!("{} costs {}. SKU: {}.", product.name, price, sku)
}

/// `"{name} is in stock (N available) and costs {price}."`, with the price
/// clause omitted when no price is set.
pub fn availability_line(product: &Product) -> String {
    let status = if product.in_stock() {
        format!("in stock ({} available)", product.stock_count())
    } else {
        "out of stock".to_string()
    };
    let price_clause = match product.price_inr {
        Some(v) => format!(" and costs {}", format_inr_amount(v)),
        None => String::new(),
    };
    format!("{} is {}{}.", product.name, status, price_clause)
}
