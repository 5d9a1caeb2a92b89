/// Display formatting for dashboard figures
///
/// Unknown or undefined values render as [`PLACEHOLDER`] rather than a misleading zero.
use rust_decimal::Decimal;

/// Rendered in place of unknown or undefined figures
pub const PLACEHOLDER: &str = "--";

/// Format a currency value with two decimals and thousands separators, eg/ `1,234.50`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    group_thousands(&format!("{:.2}", value))
}

/// Format an exact decimal currency value with two decimals and thousands separators.
pub fn format_decimal(value: Decimal) -> String {
    group_thousands(&format!("{:.2}", value.round_dp(2)))
}

/// Format a signed P/L figure, eg/ `+1,200.00` / `-250.00`.
pub fn format_pnl(value: Decimal) -> String {
    let formatted = format_decimal(value);
    if value.is_sign_positive() && !value.is_zero() {
        format!("+{formatted}")
    } else {
        formatted
    }
}

pub fn format_opt_price(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_opt_decimal(value: Option<Decimal>) -> String {
    value.map(format_decimal).unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_count(value: Option<u64>) -> String {
    value.map(|count| count.to_string()).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Format a percentage with two decimals, eg/ `55.50%`.
pub fn format_percent(value: Option<f64>) -> String {
    value
        .filter(|percent| percent.is_finite())
        .map(|percent| format!("{:.2}%", percent))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Insert `,` separators into the integer part of a formatted number.
fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(unsigned) => ("-", unsigned),
        None => ("", formatted),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(formatted.len() + integer.len() / 3);
    for (index, digit) in integer.chars().enumerate() {
        if index > 0 && (integer.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
