//! Turkish-locale number rendering: `.` groups thousands, `,` marks decimals.

fn group_thousands(int_part: &str) -> String {
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Whole number with thousands separators: 1.234.567
pub fn number(val: u64) -> String {
    group_thousands(&val.to_string())
}

/// Fixed-precision decimal: 1.234,56
pub fn decimal(val: f64, places: usize) -> String {
    if !val.is_finite() {
        return "0".to_string();
    }
    let negative = val < 0.0;
    let fixed = format!("{:.*}", places, val.abs());
    let (int_part, dec_part) = match fixed.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (fixed.as_str(), None),
    };
    let mut out = String::new();
    if negative && fixed.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(d) = dec_part {
        out.push(',');
        out.push_str(d);
    }
    out
}

/// Percentage with one decimal and the sign in front: %90,0
pub fn percent(val: f64) -> String {
    format!("%{}", decimal(val, 1))
}

/// Turkish lira amount: ₺1.234,56
pub fn lira(val: f64) -> String {
    format!("₺{}", decimal(val, 2))
}

/// Decimal without trailing zeros: 12,5 / 10 / 33,33
pub fn compact(val: f64) -> String {
    let s = decimal(val, 2);
    match s.split_once(',') {
        Some((int_part, dec)) => {
            let dec = dec.trim_end_matches('0');
            if dec.is_empty() {
                int_part.to_string()
            } else {
                format!("{int_part},{dec}")
            }
        }
        None => s,
    }
}
