//! Amount display formatting (`#,##0.00`)

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half-up to two places and group the integer part with commas.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative();
    let plain = rounded.abs().to_string();

    let (int_part, frac_part) = match plain.split_once('.') {
        Some((i, f)) => (i.to_string(), format!("{:0<2}", f)),
        None => (plain, "00".to_string()),
    };

    let mut grouped = String::new();
    let digits = int_part.as_bytes();
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
