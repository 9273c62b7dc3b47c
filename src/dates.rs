// Date parsing for spreadsheet cells.
//
// Cells arrive in several textual shapes depending on how the sheet was
// exported. Each shape is one `DateFormat` strategy; `DateParser` tries them
// in a fixed order and the first match wins.
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static SHEET_SERIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Date\(\s*(\d{1,6})\s*,\s*(\d{1,2})\s*,\s*(\d{1,2})\s*(?:,[\d\s,]*)?\)$")
        .expect("valid sheet date regex")
});
static DAY_MON_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-([A-Za-z]{3})-(\d{4})$").expect("valid d-mon-y regex"));
static DAY_FIRST_SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid slash date regex"));

static STANDARD_PARSER: Lazy<DateParser> = Lazy::new(DateParser::standard);

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One recognizable date shape.
pub trait DateFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `None` when the text is not in this shape, so the next
    /// strategy gets a chance.
    fn parse(&self, s: &str) -> Option<NaiveDate>;
}

/// Build a date from a year, a zero-based month and a day, letting
/// out-of-range months and days roll over into the following period
/// (`31-Apr` is `1-May`, month 12 is January of the next year).
pub fn rolled_date(year: i64, month0: i64, day: i64) -> Option<NaiveDate> {
    let year = year.checked_add(month0.div_euclid(12))?;
    let month = month0.rem_euclid(12) as u32 + 1;
    let first = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, 1)?;
    first.checked_add_signed(Duration::days(day - 1))
}

fn capture_i64(caps: &regex::Captures<'_>, idx: usize) -> Option<i64> {
    caps.get(idx)?.as_str().parse().ok()
}

/// `Date(2026,0,15)` as emitted by the sheets JSON endpoint; month is zero-based.
pub struct SheetSerialDate;

impl DateFormat for SheetSerialDate {
    fn name(&self) -> &'static str {
        "sheet-serial"
    }

    fn parse(&self, s: &str) -> Option<NaiveDate> {
        let caps = SHEET_SERIAL_RE.captures(s)?;
        rolled_date(capture_i64(&caps, 1)?, capture_i64(&caps, 2)?, capture_i64(&caps, 3)?)
    }
}

/// `1-Jan-2026`. The month abbreviation is case-sensitive.
pub struct DayMonthNameYear;

impl DateFormat for DayMonthNameYear {
    fn name(&self) -> &'static str {
        "d-mon-yyyy"
    }

    fn parse(&self, s: &str) -> Option<NaiveDate> {
        let caps = DAY_MON_YEAR_RE.captures(s)?;
        let abbrev = caps.get(2)?.as_str();
        let month0 = MONTH_ABBREVIATIONS.iter().position(|m| *m == abbrev)?;
        rolled_date(capture_i64(&caps, 3)?, month0 as i64, capture_i64(&caps, 1)?)
    }
}

/// `15/01/2026`, day first.
pub struct DayFirstSlash;

impl DateFormat for DayFirstSlash {
    fn name(&self) -> &'static str {
        "d/m/yyyy"
    }

    fn parse(&self, s: &str) -> Option<NaiveDate> {
        let caps = DAY_FIRST_SLASH_RE.captures(s)?;
        rolled_date(
            capture_i64(&caps, 3)?,
            capture_i64(&caps, 2)? - 1,
            capture_i64(&caps, 1)?,
        )
    }
}

/// Catch-all for the common machine and English forms: ISO dates and
/// date-times, RFC 2822, `2026/01/15`, `January 15, 2026`, `15 Jan 2026`,
/// and `15-mar-2026` in any letter case.
pub struct GeneralDate;

const GENERAL_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const GENERAL_DATE_FORMATS: [&str; 11] = [
    "%Y-%m-%d",
    "%d-%b-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %d %b %Y",
];

impl DateFormat for GeneralDate {
    fn name(&self) -> &'static str {
        "general"
    }

    fn parse(&self, s: &str) -> Option<NaiveDate> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.date_naive());
        }
        GENERAL_DATETIME_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.date()))
            .or_else(|| {
                GENERAL_DATE_FORMATS
                    .iter()
                    .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
            })
    }
}

/// Ordered chain of date strategies.
pub struct DateParser {
    formats: Vec<Box<dyn DateFormat>>,
}

impl DateParser {
    /// An empty chain; every input yields `None` until formats are added.
    pub fn new() -> Self {
        DateParser { formats: Vec::new() }
    }

    /// The chain used for sheet data: sheet serial, `D-Mon-YYYY`,
    /// day-first slash, then the general fallback.
    pub fn standard() -> Self {
        DateParser::new()
            .with_format(SheetSerialDate)
            .with_format(DayMonthNameYear)
            .with_format(DayFirstSlash)
            .with_format(GeneralDate)
    }

    pub fn with_format(mut self, format: impl DateFormat + 'static) -> Self {
        self.formats.push(Box::new(format));
        self
    }

    pub fn format_names(&self) -> Vec<&'static str> {
        self.formats.iter().map(|f| f.name()).collect()
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        self.parse_with_format(raw).map(|(_, date)| date)
    }

    /// Like [`parse`](Self::parse) but also reports which strategy matched.
    pub fn parse_with_format(&self, raw: &str) -> Option<(&'static str, NaiveDate)> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }
        self.formats
            .iter()
            .find_map(|f| f.parse(s).map(|d| (f.name(), d)))
    }
}

impl Default for DateParser {
    fn default() -> Self {
        DateParser::standard()
    }
}

/// Parse a cell with the standard chain. Missing and blank cells are `None`.
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    STANDARD_PARSER.parse(raw?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn textual_month_and_sheet_serial_agree() {
        assert_eq!(parse_date(Some("1-Jan-2026")), Some(date(2026, 1, 1)));
        assert_eq!(parse_date(Some("Date(2026,0,1)")), Some(date(2026, 1, 1)));
    }

    #[test]
    fn blank_and_missing_are_none() {
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(Some("   ")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn sheet_serial_ignores_time_components() {
        assert_eq!(
            parse_date(Some("Date(2026,11,24,10,30,0)")),
            Some(date(2026, 12, 24))
        );
    }

    #[test]
    fn other_month_case_falls_through_to_general() {
        let parser = DateParser::standard();
        assert_eq!(
            parser.parse_with_format("15-Mar-2026"),
            Some(("d-mon-yyyy", date(2026, 3, 15)))
        );
        assert_eq!(
            parser.parse_with_format("15-MAR-2026"),
            Some(("general", date(2026, 3, 15)))
        );
        assert_eq!(
            parser.parse_with_format("1-mar-2026"),
            Some(("general", date(2026, 3, 1)))
        );
        assert_eq!(parser.parse("15-Foo-2026"), None);
    }

    #[test]
    fn slash_dates_are_day_first() {
        assert_eq!(parse_date(Some("05/03/2026")), Some(date(2026, 3, 5)));
        assert_eq!(parse_date(Some("5/3/2026")), Some(date(2026, 3, 5)));
    }

    #[test]
    fn overflowing_days_roll_into_next_month() {
        assert_eq!(parse_date(Some("31-Apr-2026")), Some(date(2026, 5, 1)));
        assert_eq!(parse_date(Some("30/02/2026")), Some(date(2026, 3, 2)));
        assert_eq!(parse_date(Some("Date(2026,1,29)")), Some(date(2026, 3, 1)));
    }

    #[test]
    fn overflowing_month_rolls_into_next_year() {
        assert_eq!(parse_date(Some("01/13/2026")), Some(date(2027, 1, 1)));
        assert_eq!(parse_date(Some("Date(2026,12,1)")), Some(date(2027, 1, 1)));
    }

    #[test]
    fn general_fallback_handles_iso_and_english() {
        let parser = DateParser::standard();
        assert_eq!(
            parser.parse_with_format("2026-07-04"),
            Some(("general", date(2026, 7, 4)))
        );
        assert_eq!(parser.parse("2026-07-04T09:15:00Z"), Some(date(2026, 7, 4)));
        assert_eq!(parser.parse("2026-07-04T09:15:00"), Some(date(2026, 7, 4)));
        assert_eq!(parser.parse("July 4, 2026"), Some(date(2026, 7, 4)));
        assert_eq!(parser.parse("4 Jul 2026"), Some(date(2026, 7, 4)));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_date(Some("pronto")), None);
        assert_eq!(parse_date(Some("TBD")), None);
        assert_eq!(parse_date(Some("2026-13-45")), None);
    }

    #[test]
    fn priority_order_is_fixed() {
        let parser = DateParser::standard();
        assert_eq!(
            parser.format_names(),
            vec!["sheet-serial", "d-mon-yyyy", "d/m/yyyy", "general"]
        );
    }

    #[test]
    fn custom_chain_only_uses_its_formats() {
        let parser = DateParser::new().with_format(DayFirstSlash);
        assert_eq!(parser.parse("1-Jan-2026"), None);
        assert_eq!(parser.parse("1/1/2026"), Some(date(2026, 1, 1)));
    }

    #[test]
    fn day_zero_rolls_back() {
        assert_eq!(rolled_date(2026, 2, 0), Some(date(2026, 2, 28)));
    }
}
