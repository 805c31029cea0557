pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

pub use order::OrderStatus;
pub use product::Category;
pub use user::Role;

/// Convert stored integer cents to the decimal amount exposed over JSON.
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Convert a decimal amount to integer cents, rounding to the nearest cent.
pub fn amount_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_round_trip_for_menu_prices() {
        assert_eq!(amount_to_cents(12.99), 1299);
        assert_eq!(amount_to_cents(0.1 + 0.2), 30);
        assert_eq!(cents_to_amount(2000), 20.0);
    }
}
