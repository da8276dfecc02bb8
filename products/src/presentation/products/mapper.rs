//! Domain to presentation mapping for product rows.

use super::udf::{FREE_SHIPPING_LABEL, ProductUi};
use crate::domain::model::ProductItem;

/// Project a domain item into a grid row
#[must_use]
pub fn to_product_ui(item: ProductItem) -> ProductUi {
    ProductUi {
        price: format_price(item.price),
        free_shipping: item.free_shipping.then_some(FREE_SHIPPING_LABEL),
        id: item.id,
        name: item.title,
        image_url: item.thumbnail,
        condition: item.condition,
        available_quantity: item.available_quantity,
        total: item.total,
    }
}

/// Format a price in Brazilian reais, e.g. `R$ 1.499,00`
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Prices are far below i64::MAX cents
pub fn format_price(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    let digits = (cents / 100).to_string();
    let mut reais = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            reais.push('.');
        }
        reais.push(digit);
    }

    format!("R$ {sign}{reais},{:02}", cents % 100)
}
