//! Fixed-point decimal handling for tape values.
//!
//! Every money, rate and fee value on a tape is carried as integer micros
//! (1.0 = 1_000_000 micros). Conversion from text never goes through
//! floating point, so a value read twice always compares equal.
//!
//! Parsing is tolerant by contract: anything that is not a recognisable
//! number yields `None` ("unknown"), never zero.

/// Micros scale (1e-6) used for money, rates and fees.
pub const MICROS_SCALE: i64 = 1_000_000;

/// Convert a decimal string to integer micros.
///
/// Accepted:
/// - optional leading `+` / `-`
/// - optional `$` currency prefix (before or after the sign)
/// - `,` thousands separators in the integer part
/// - an optional fractional part; digits past the 6th place are rounded
///   half away from zero
///
/// Returns `None` for empty input, stray characters, multiple `.`
/// separators, or values that overflow `i64` micros.
pub fn decimal_to_micros(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let s = s.strip_prefix('$').unwrap_or(s);
    let (negative, rest) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    };
    let digits = rest.strip_prefix('$').unwrap_or(rest).trim();

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let int_clean: String = int_part.chars().filter(|c| *c != ',').collect();
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if !all_digits(&int_clean) || !all_digits(frac_part) {
        return None;
    }
    // "1,,2" / ",5" style grouping is rejected rather than guessed at.
    if int_part.contains(',') && !valid_grouping(int_part) {
        return None;
    }

    let int_val: i64 = if int_clean.is_empty() {
        0
    } else {
        int_clean.parse::<i64>().ok()?
    };

    let mut frac_padded: String = frac_part.chars().take(6).collect();
    while frac_padded.len() < 6 {
        frac_padded.push('0');
    }
    let mut frac_val: i64 = frac_padded.parse::<i64>().ok()?;

    let round_up = frac_part
        .chars()
        .nth(6)
        .map(|c| c >= '5')
        .unwrap_or(false);
    if round_up {
        frac_val += 1;
    }

    let micros = int_val
        .checked_mul(MICROS_SCALE)
        .and_then(|v| v.checked_add(frac_val))?;

    Some(if negative { -micros } else { micros })
}

fn valid_grouping(int_part: &str) -> bool {
    let groups: Vec<&str> = int_part.split(',').collect();
    let Some((first, rest)) = groups.split_first() else {
        return false;
    };
    !first.is_empty() && first.len() <= 3 && rest.iter().all(|g| g.len() == 3)
}

/// Parse a whole-number count (e.g. remaining term in months).
///
/// `"359"` and `"359.0"` are accepted; `"359.5"` is unknown.
pub fn parse_whole(s: &str) -> Option<i64> {
    let micros = decimal_to_micros(s)?;
    if micros % MICROS_SCALE != 0 {
        return None;
    }
    Some(micros / MICROS_SCALE)
}

/// Divide, rounding half away from zero.
fn div_round(value: i64, divisor: i64) -> i64 {
    let q = value / divisor;
    let r = value % divisor;
    if r.abs() * 2 >= divisor {
        q + value.signum()
    } else {
        q
    }
}

fn group_thousands(n: u128) -> String {
    let raw = n.to_string();
    let mut out = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, ch) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render micros as dollars and cents: `$1,234.56` / `-$12.00`.
pub fn format_money(micros: i64) -> String {
    format_money_wide(i128::from(micros))
}

/// [`format_money`] for aggregated amounts.
pub fn format_money_wide(micros: i128) -> String {
    let q = micros / 10_000;
    let r = micros % 10_000;
    let cents = if r.abs() * 2 >= 10_000 { q + micros.signum() } else { q };
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", group_thousands(abs / 100), abs % 100)
}

/// Render a fraction in micros with `places` decimal places (0..=6):
/// `format_fraction(65_000, 4) == "0.0650"`.
pub fn format_fraction(micros: i64, places: u32) -> String {
    let places = places.min(6);
    let divisor = 10_i64.pow(6 - places);
    let scaled = div_round(micros, divisor);
    let sign = if scaled < 0 { "-" } else { "" };
    let abs = scaled.unsigned_abs();
    if places == 0 {
        return format!("{sign}{abs}");
    }
    let unit = 10_u64.pow(places);
    format!(
        "{sign}{}.{:0width$}",
        abs / unit,
        abs % unit,
        width = places as usize
    )
}

/// Render a fraction in micros as a percentage with 4 decimal places:
/// `format_percent(65_000) == "6.5000%"`.
///
/// At this precision one micro is exactly one unit in the last place.
pub fn format_percent(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    format!("{sign}{}.{:04}%", abs / 10_000, abs % 10_000)
}
