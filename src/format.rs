//! Indian-locale presentation helpers.

/// Formats an amount as rupees with lakh/crore digit grouping, e.g. `₹1,23,456.70`.
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "₹-".to_string();
    }
    let paise_total = (amount.abs() * 100.0).round() as u64;
    let rupees = paise_total / 100;
    let paise = paise_total % 100;
    let sign = if amount < 0.0 && paise_total > 0 { "-" } else { "" };
    format!("{sign}₹{}.{paise:02}", group_indian(rupees))
}

fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut groups = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

/// Short lakh notation used in slab range labels: `250000 -> "2.5L"`.
pub fn lakh_label(amount: f64) -> String {
    format!("{}L", amount / 100_000.0)
}

pub fn format_percent(rate: f64) -> String {
    format!("{}%", (rate * 10_000.0).round() / 100.0)
}
