//! Date field resolution
//!
//! The header date is free-form text. On the command line it may also be given
//! as a date expression (`today`, `Tuesday+1`, `2024-05-01`), which is
//! resolved to a calendar date and formatted before it reaches the header.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};

/// How resolved dates are written into the header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `2024-05-01`
    #[default]
    Iso,
    /// `May 1, 2024`
    Long,
}

impl DateStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "iso" => Some(DateStyle::Iso),
            "long" => Some(DateStyle::Long),
            _ => None,
        }
    }
}

/// A parsed `--date` value
#[derive(Debug, Clone, PartialEq)]
pub enum DateExpression {
    /// Today's date
    Today,
    /// A calendar date given literally
    Explicit(NaiveDate),
    /// The next `day` (today counts), pushed `offset` weeks further
    DayOfWeek { day: Weekday, offset: u32 },
    /// Empty input
    None,
}

/// Parse a date expression
///
/// Accepted forms: `""`, `today`, `2024-11-20`, `11/20/2024`, `Tuesday`,
/// `tue`, and `Tuesday+3` (the fourth upcoming Tuesday).
pub fn parse_date_expression(expr: &str) -> Result<DateExpression> {
    let expr = expr.trim();

    if expr.is_empty() {
        return Ok(DateExpression::None);
    }
    if expr.eq_ignore_ascii_case("today") {
        return Ok(DateExpression::Today);
    }

    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(expr, format) {
            return Ok(DateExpression::Explicit(date));
        }
    }

    let (day, offset) = match expr.split_once('+') {
        Some((day, offset)) => {
            let offset = offset.trim().parse().map_err(|_| {
                Error::InvalidDateExpression(format!("Invalid offset: {}", offset))
            })?;
            (day, offset)
        }
        None => (expr, 0),
    };

    match parse_weekday(day) {
        Some(day) => Ok(DateExpression::DayOfWeek { day, offset }),
        None => Err(Error::InvalidDateExpression(format!(
            "Unable to parse date expression: {}",
            expr
        ))),
    }
}

/// Weekday from its full or three-letter English name, any case
fn parse_weekday(s: &str) -> Option<Weekday> {
    let s = s.trim().to_ascii_lowercase();
    let day = match s.as_str() {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Resolve an expression against today's local date
pub fn resolve_date(expr: &DateExpression) -> Option<NaiveDate> {
    resolve_date_from(expr, Local::now().date_naive())
}

/// Resolve an expression against a given `today`
///
/// `None` for an empty expression, or when the offset lands outside the
/// calendar range chrono can represent.
pub fn resolve_date_from(expr: &DateExpression, today: NaiveDate) -> Option<NaiveDate> {
    match expr {
        DateExpression::None => None,
        DateExpression::Today => Some(today),
        DateExpression::Explicit(date) => Some(*date),
        DateExpression::DayOfWeek { day, offset } => next_weekday(today, *day, *offset),
    }
}

fn next_weekday(today: NaiveDate, target: Weekday, offset: u32) -> Option<NaiveDate> {
    let from = today.weekday().num_days_from_monday();
    let to = target.num_days_from_monday();
    let days_until = i64::from((to + 7 - from) % 7);
    let days = i64::from(offset).checked_mul(7)?.checked_add(days_until)?;
    today.checked_add_signed(chrono::Duration::try_days(days)?)
}

/// Format a date in the given style
///
/// `Iso` gives "2024-11-20", `Long` gives "November 20, 2024".
pub fn format_date(date: &NaiveDate, style: DateStyle) -> String {
    match style {
        DateStyle::Iso => date.format("%Y-%m-%d").to_string(),
        DateStyle::Long => date.format("%B %-d, %Y").to_string(),
    }
}

/// Turn user input for the date field into header text
///
/// Recognized date expressions are resolved and formatted; anything else is
/// kept verbatim (e.g. "Spring term, week 3").
pub fn resolve_date_field(input: &str, style: DateStyle) -> String {
    let resolved = parse_date_expression(input)
        .ok()
        .and_then(|expr| resolve_date(&expr));
    match resolved {
        Some(date) => format_date(&date, style),
        None => input.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_date_expression("").unwrap(), DateExpression::None);
        assert_eq!(parse_date_expression("   ").unwrap(), DateExpression::None);
        assert_eq!(parse_date_expression("TODAY").unwrap(), DateExpression::Today);
        assert_eq!(
            parse_date_expression("2024-11-20").unwrap(),
            DateExpression::Explicit(ymd(2024, 11, 20))
        );
        assert_eq!(
            parse_date_expression("11/20/2024").unwrap(),
            DateExpression::Explicit(ymd(2024, 11, 20))
        );
    }

    #[test]
    fn test_parse_weekdays() {
        let cases = [
            ("Tuesday", Weekday::Tue, 0),
            ("fri", Weekday::Fri, 0),
            ("Tuesday+3", Weekday::Tue, 3),
            ("Monday + 1", Weekday::Mon, 1),
            ("SUN", Weekday::Sun, 0),
        ];
        for (input, day, offset) in cases {
            assert_eq!(
                parse_date_expression(input).unwrap(),
                DateExpression::DayOfWeek { day, offset },
                "parsing {}",
                input
            );
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_date_expression("NotADay").is_err());
        assert!(parse_date_expression("2024-13-01").is_err());
        assert!(matches!(
            parse_date_expression("Tuesday+abc"),
            Err(Error::InvalidDateExpression(_))
        ));
    }

    #[test]
    fn test_resolve_from_fixed_day() {
        // 2024-11-20 is a Wednesday
        let today = ymd(2024, 11, 20);
        let weekday = |day, offset| DateExpression::DayOfWeek { day, offset };

        assert_eq!(resolve_date_from(&DateExpression::None, today), None);
        assert_eq!(resolve_date_from(&DateExpression::Today, today), Some(today));
        assert_eq!(resolve_date_from(&weekday(Weekday::Wed, 0), today), Some(today));
        assert_eq!(resolve_date_from(&weekday(Weekday::Thu, 0), today), Some(ymd(2024, 11, 21)));
        assert_eq!(resolve_date_from(&weekday(Weekday::Tue, 0), today), Some(ymd(2024, 11, 26)));
        assert_eq!(resolve_date_from(&weekday(Weekday::Tue, 1), today), Some(ymd(2024, 12, 3)));
    }

    #[test]
    fn test_resolve_huge_offset() {
        let today = ymd(2024, 11, 20);
        for offset in [100_000_000, u32::MAX] {
            let expr = DateExpression::DayOfWeek { day: Weekday::Tue, offset };
            assert_eq!(resolve_date_from(&expr, today), None);
        }
    }

    #[test]
    fn test_resolve_date_field_keeps_unreachable_dates() {
        for input in ["Tuesday+100000000", "Tuesday+4294967295", "Tuesday+1000000000"] {
            assert_eq!(resolve_date_field(input, DateStyle::Iso), input);
        }
    }

    #[test]
    fn test_resolve_today() {
        assert_eq!(resolve_date(&DateExpression::Today), Some(Local::now().date_naive()));
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 20).unwrap();
        assert_eq!(format_date(&date, DateStyle::Long), "November 20, 2024");
        assert_eq!(format_date(&date, DateStyle::Iso), "2024-11-20");

        let date = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        assert_eq!(format_date(&date, DateStyle::Long), "January 7, 2026");
        assert_eq!(format_date(&date, DateStyle::Iso), "2026-01-07");
    }

    #[test]
    fn test_resolve_date_field() {
        assert_eq!(resolve_date_field("2024-05-01", DateStyle::Iso), "2024-05-01");
        assert_eq!(resolve_date_field("05/01/2024", DateStyle::Iso), "2024-05-01");
        assert_eq!(resolve_date_field("2024-05-01", DateStyle::Long), "May 1, 2024");
        assert_eq!(resolve_date_field("", DateStyle::Iso), "");

        let today = Local::now().date_naive();
        assert_eq!(
            resolve_date_field("today", DateStyle::Iso),
            format_date(&today, DateStyle::Iso)
        );
    }

    #[test]
    fn test_resolve_date_field_keeps_free_text() {
        assert_eq!(
            resolve_date_field("Spring term, week 3", DateStyle::Iso),
            "Spring term, week 3"
        );
        assert_eq!(resolve_date_field("  Mid-term  ", DateStyle::Long), "Mid-term");
    }

    #[test]
    fn test_date_style_names() {
        assert_eq!(DateStyle::from_name("ISO"), Some(DateStyle::Iso));
        assert_eq!(DateStyle::from_name("long"), Some(DateStyle::Long));
        assert_eq!(DateStyle::from_name("short"), None);
    }
}
