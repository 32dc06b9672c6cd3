//! USD price arithmetic shared by carts, orders and the chatbot.

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unit price after a percentage discount. Negative discounts count as none.
pub fn final_price(price: f64, discount: f64) -> f64 {
    let discount = discount.max(0.0);
    if discount > 0.0 {
        round2(price * (1.0 - discount / 100.0))
    } else {
        round2(price)
    }
}

/// `1234.5` -> `"1,234.50"`
pub fn format_usd(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_price_applies_discount() {
        assert_eq!(final_price(20.0, 25.0), 15.0);
        assert_eq!(final_price(9.99, 10.0), 8.99);
        assert_eq!(final_price(12.346, 0.0), 12.35);
        assert_eq!(final_price(12.0, -5.0), 12.0);
    }

    #[test]
    fn test_format_usd_groups_thousands() {
        assert_eq!(format_usd(0.0), "0.00");
        assert_eq!(format_usd(7.5), "7.50");
        assert_eq!(format_usd(999.999), "1,000.00");
        assert_eq!(format_usd(1234567.891), "1,234,567.89");
        assert_eq!(format_usd(-42.0), "-42.00");
    }
}
