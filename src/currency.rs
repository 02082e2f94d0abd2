//! Currency formatting for prediction responses

/// Format `amount` rounded to whole units with thousands separators,
/// e.g. `format_amount("₹", 1234567.4) == "₹ 1,234,567"`.
pub fn format_amount(symbol: &str, amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let sign = if amount < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{} {}{}", symbol, sign, group_thousands(&rounded))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
