use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DAY_MONTH_NAME_YEAR: Regex =
        Regex::new(r"\b(\d{1,2})\s+([A-Za-z]{3})\s+(\d{4})\b").unwrap();
    static ref ISO_DATE: Regex = Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap();
    static ref DAY_MONTH_YEAR: Regex =
        Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").unwrap();
    static ref DAY_MONTH_SHORT_YEAR: Regex =
        Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2})\b").unwrap();
    static ref LINK_TITLE_DATE: Regex = Regex::new(r"(\d{2})-(\d{2})-(\d{4})").unwrap();
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Finds a date in free text. Formats are tried in order: `DD Mon YYYY`,
/// `YYYY-MM-DD`, `DD-MM-YYYY` / `DD/MM/YYYY`, then `DD-MM-YY` / `DD/MM/YY`.
///
/// Two-digit years of 50 and above are 19xx, the rest 20xx.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.replace('\u{a0}', " ").replace("&nbsp;", " ");

    if let Some(caps) = DAY_MONTH_NAME_YEAR.captures(&text) {
        let month_name = caps[2].to_lowercase();
        if let Some(month) = MONTHS.iter().position(|m| *m == month_name) {
            let date = ymd(&caps[3], &(month + 1).to_string(), &caps[1]);
            if date.is_some() {
                return date;
            }
        }
    }

    if let Some(caps) = ISO_DATE.captures(&text) {
        if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
            return Some(date);
        }
    }

    if let Some(caps) = DAY_MONTH_YEAR.captures(&text) {
        if let Some(date) = ymd(&caps[3], &caps[2], &caps[1]) {
            return Some(date);
        }
    }

    let caps = DAY_MONTH_SHORT_YEAR.captures(&text)?;
    let short_year: i32 = caps[3].parse().ok()?;
    let year = if short_year >= 50 {
        1900 + short_year
    } else {
        2000 + short_year
    };
    ymd(&year.to_string(), &caps[2], &caps[1])
}

/// Date in a link title such as "Gezwommen op 29-01-2023".
pub fn parse_link_title_date(title: &str) -> Option<NaiveDate> {
    let caps = LINK_TITLE_DATE.captures(title)?;
    ymd(&caps[3], &caps[2], &caps[1])
}

/// Parses `text` if present, otherwise falls back to `today`. The flag is true
/// when the fallback was used.
pub fn resolve_date(text: Option<&str>, today: NaiveDate) -> (NaiveDate, bool) {
    match text.and_then(parse_date) {
        Some(date) => (date, false),
        None => (today, true),
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_name_format() {
        assert_eq!(parse_date("12 Mar 2023"), Some(date(2023, 3, 12)));
        assert_eq!(parse_date("3\u{a0}oct\u{a0}2021"), Some(date(2021, 10, 3)));
        assert_eq!(parse_date("&nbsp;7 JUN 2019&nbsp;"), Some(date(2019, 6, 7)));
    }

    #[test]
    fn test_numeric_formats() {
        assert_eq!(parse_date("2022-11-05"), Some(date(2022, 11, 5)));
        assert_eq!(parse_date("05-11-2022"), Some(date(2022, 11, 5)));
        assert_eq!(parse_date("5/11/2022"), Some(date(2022, 11, 5)));
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(parse_date("01-02-49"), Some(date(2049, 2, 1)));
        assert_eq!(parse_date("01/02/50"), Some(date(1950, 2, 1)));
        assert_eq!(parse_date("31-12-99"), Some(date(1999, 12, 31)));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("Amsterdam"), None);
        assert_eq!(parse_date("31 Foo 2020"), None);
        assert_eq!(parse_date("31-02-2020"), None);
    }

    #[test]
    fn test_link_title() {
        assert_eq!(
            parse_link_title_date("Gezwommen op 29-01-2023 in Utrecht"),
            Some(date(2023, 1, 29))
        );
        assert_eq!(parse_link_title_date("Gezwommen op"), None);
    }

    #[test]
    fn test_resolve_falls_back_to_today() {
        let today = date(2024, 6, 1);
        assert_eq!(resolve_date(Some("2 Feb 2020"), today), (date(2020, 2, 2), false));
        assert_eq!(resolve_date(Some("n/a"), today), (today, true));
        assert_eq!(resolve_date(None, today), (today, true));
    }
}
