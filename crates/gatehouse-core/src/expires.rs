// ── Account expiration dates ──
//
// Operators are told to type MM/DD/YYYY, but ISO dates, `today`,
// `tomorrow` and relative offsets such as `+2 weeks` are accepted too.

use chrono::{Days, Months, NaiveDate};

use crate::model::user::EXPIRES_FORMAT;

pub const INVALID_EXPIRES: &str = "Invalid expiration date format; use MM/DD/YYYY instead.";

/// Resolve `input` to a calendar date relative to `today`.
pub fn parse(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = input.trim().to_ascii_lowercase();
    match text.as_str() {
        "" => return None,
        "today" | "now" => return Some(today),
        "tomorrow" => return today.checked_add_days(Days::new(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&text, EXPIRES_FORMAT) {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return Some(date);
    }
    parse_offset(&text, today)
}

fn parse_offset(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let rest = text.strip_prefix('+')?;
    let mut parts = rest.split_whitespace();
    let count: u32 = parts.next()?.parse().ok()?;
    let unit = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    match unit.trim_end_matches('s') {
        "day" => today.checked_add_days(Days::new(count.into())),
        "week" => today.checked_add_days(Days::new(u64::from(count) * 7)),
        "month" => today.checked_add_months(Months::new(count)),
        "year" => today.checked_add_months(Months::new(count.checked_mul(12)?)),
        _ => None,
    }
}

/// Render a date the way it is stored and shown.
pub fn format(date: NaiveDate) -> String {
    date.format(EXPIRES_FORMAT).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 30).unwrap()
    }

    #[test]
    fn absolute_formats() {
        let expected = NaiveDate::from_ymd_opt(2027, 3, 4);
        assert_eq!(parse("03/04/2027", today()), expected);
        assert_eq!(parse("2027-03-04", today()), expected);
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(format(parse("+1 week", today()).unwrap()), "02/06/2026");
        assert_eq!(format(parse("+1 day", today()).unwrap()), "01/31/2026");
        assert_eq!(format(parse("+1 month", today()).unwrap()), "02/28/2026");
        assert_eq!(format(parse("+2 years", today()).unwrap()), "01/30/2028");
        assert_eq!(format(parse("tomorrow", today()).unwrap()), "01/31/2026");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("next tuesday-ish", today()), None);
        assert_eq!(parse("13/45/2026", today()), None);
        assert_eq!(parse("+3 fortnights", today()), None);
        assert_eq!(parse("+x days", today()), None);
    }
}
