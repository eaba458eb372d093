//! Free-text date phrases to `YYYY-MM-DD`.
//!
//! Rules are tried in order and the first one that yields a valid calendar
//! date wins:
//!
//! 1. Numeric dates: `YYYY-MM-DD`, `DD/MM/YYYY`, `DD-MM-YYYY`.
//! 2. Relative offsets: today, tomorrow, day after tomorrow, "N days/weeks/months".
//! 3. Weekdays: "next Tuesday" and a bare "Tuesday".
//! 4. A lone day number, read as that day of the reference month.
//!
//! Known approximations, kept on purpose because callers depend on the output:
//! years in `[1400, 1500)` are Persian-calendar years and get `+621` with the
//! month and day left as spoken, a week is 7 days and a month is 30 days.
//!
//! Nothing here reads the wall clock; the reference date is always passed in.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::{Captures, Regex};

use super::lexicon::normalize_text;

pub type Extractor = fn(&Captures<'_>, NaiveDate) -> Option<NaiveDate>;

pub struct DateRule {
    pub name: &'static str,
    pattern: Regex,
    extract: Extractor,
}

impl DateRule {
    pub fn new(name: &'static str, pattern: &str, extract: Extractor) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            extract,
        })
    }
}

const PERSIAN_YEARS: std::ops::Range<i32> = 1400..1500;
const PERSIAN_YEAR_OFFSET: i32 = 621;

const EN_WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";
// Longer names first so "سه شنبه" is not read as "شنبه".
const FA_WEEKDAYS: &str = "یک ?شنبه|دو ?شنبه|سه ?شنبه|چهار ?شنبه|پنج ?شنبه|شنبه|جمعه";
const FA_NEXT_WEEK: &str = r"هفته\s*(?:ی\s*)?(?:دیگه|دیگر|بعد|بعدی|آینده)";

pub struct DateExpressionParser {
    rules: Vec<DateRule>,
}

impl Default for DateExpressionParser {
    fn default() -> Self {
        Self::standard()
    }
}

impl DateExpressionParser {
    /// English and Persian rules.
    pub fn standard() -> Self {
        let table: Vec<(&'static str, String, Extractor)> = vec![
            ("iso", r"([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})".into(), year_month_day as Extractor),
            (
                "day-month-year",
                r"([0-9]{1,2})\s*[/\-]\s*([0-9]{1,2})\s*[/\-]\s*([0-9]{4})".into(),
                day_month_year as Extractor,
            ),
            (
                "day-after-tomorrow",
                r"\bday after tomorrow\b|پس ?فردا|بعد ?فردا".into(),
                day_after_tomorrow as Extractor,
            ),
            ("tomorrow", r"\btomorrow\b|فردا".into(), tomorrow as Extractor),
            ("today", r"\btoday\b|امروز".into(), same_day as Extractor),
            (
                "count-unit",
                r"\b([0-9]+|a|an|one|two|three|four|five|six|seven)\s+(days?|weeks?|months?)\b".into(),
                count_unit as Extractor,
            ),
            (
                "count-unit-fa",
                r"(?:^|\s)([0-9]+|یک|یه|دو|سه|چهار|پنج|شش|هفت)\s*(روز|هفته|ماه)\s*(?:دیگه|دیگر|بعد|آینده|بعدی)"
                    .into(),
                count_unit as Extractor,
            ),
            (
                "next-weekday",
                format!(
                    r"\bnext\s+(?:week\s+)?({en})\b|\b({en})\s+(?:of\s+)?next\s+week\b|{next}\s*(?:روز\s*)?({fa})|({fa})\s*(?:ی\s*)?{next}",
                    en = EN_WEEKDAYS,
                    fa = FA_WEEKDAYS,
                    next = FA_NEXT_WEEK
                ),
                next_weekday_rule as Extractor,
            ),
            (
                "weekday",
                format!(r"\b({en})\b|({fa})", en = EN_WEEKDAYS, fa = FA_WEEKDAYS),
                coming_weekday_rule as Extractor,
            ),
            ("bare-day", r"^[^0-9]*([0-9]{1,2})[^0-9]*$".into(), bare_day as Extractor),
        ];

        let rules = table
            .into_iter()
            .filter_map(|(name, pattern, extract)| match DateRule::new(name, &pattern, extract) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    tracing::error!("date rule {} failed to compile: {}", name, e);
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn with_rules(rules: Vec<DateRule>) -> Self {
        Self { rules }
    }

    pub fn parse_date(&self, text: &str, reference: NaiveDate) -> Option<NaiveDate> {
        let text = normalize_text(text);
        if text.is_empty() {
            return None;
        }
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(&text) {
                if let Some(date) = (rule.extract)(&caps, reference) {
                    tracing::debug!("date rule {} matched", rule.name);
                    return Some(date);
                }
            }
        }
        None
    }

    /// Zero-padded `YYYY-MM-DD`, or `None` when no rule matched.
    pub fn parse(&self, text: &str, reference: NaiveDate) -> Option<String> {
        self.parse_date(text, reference).map(format_iso)
    }
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn number(caps: &Captures<'_>, i: usize) -> Option<i32> {
    caps.get(i)?.as_str().parse().ok()
}

fn calendar_date(year: i32, month: i32, day: i32) -> Option<NaiveDate> {
    let year = if PERSIAN_YEARS.contains(&year) {
        year + PERSIAN_YEAR_OFFSET
    } else {
        year
    };
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

fn year_month_day(caps: &Captures<'_>, _: NaiveDate) -> Option<NaiveDate> {
    calendar_date(number(caps, 1)?, number(caps, 2)?, number(caps, 3)?)
}

fn day_month_year(caps: &Captures<'_>, _: NaiveDate) -> Option<NaiveDate> {
    calendar_date(number(caps, 3)?, number(caps, 2)?, number(caps, 1)?)
}

fn offset(today: NaiveDate, days: i64) -> Option<NaiveDate> {
    today.checked_add_signed(Duration::days(days))
}

fn same_day(_: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    offset(today, 0)
}

fn tomorrow(_: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    offset(today, 1)
}

fn day_after_tomorrow(_: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    offset(today, 2)
}

fn count_word(word: &str) -> Option<i64> {
    let n = match word {
        "a" | "an" | "one" | "یک" | "یه" => 1,
        "two" | "دو" => 2,
        "three" | "سه" => 3,
        "four" | "چهار" => 4,
        "five" | "پنج" => 5,
        "six" | "شش" => 6,
        "seven" | "هفت" => 7,
        digits => digits.parse().ok()?,
    };
    Some(n)
}

fn count_unit(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let count = count_word(caps.get(1)?.as_str())?;
    let unit = caps.get(2)?.as_str();
    let days_per_unit = if unit.starts_with("day") || unit == "روز" {
        1
    } else if unit.starts_with("week") || unit == "هفته" {
        7
    } else {
        30
    };
    if count <= 0 {
        return None;
    }
    offset(today, count.checked_mul(days_per_unit)?)
}

fn weekday_named(name: &str) -> Option<Weekday> {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    let day = match compact.as_str() {
        "monday" | "دوشنبه" => Weekday::Mon,
        "tuesday" | "سهشنبه" => Weekday::Tue,
        "wednesday" | "چهارشنبه" => Weekday::Wed,
        "thursday" | "پنجشنبه" => Weekday::Thu,
        "friday" | "جمعه" => Weekday::Fri,
        "saturday" | "شنبه" => Weekday::Sat,
        "sunday" | "یکشنبه" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

fn first_weekday(caps: &Captures<'_>) -> Option<Weekday> {
    caps.iter().skip(1).flatten().find_map(|m| weekday_named(m.as_str()))
}

/// Days until the next occurrence of `target` strictly after `today`.
/// A target equal to today is a week away, never zero.
pub fn days_until_weekday(today: NaiveDate, target: Weekday) -> i64 {
    let diff = target.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64;
    if diff <= 0 {
        diff + 7
    } else {
        diff
    }
}

/// "next <weekday>": that weekday in the following week, weeks starting on
/// Saturday. Built on [`days_until_weekday`], pushed a further week when the
/// coming occurrence still falls inside the current week.
pub fn days_until_next_week_weekday(today: NaiveDate, target: Weekday) -> i64 {
    let coming = days_until_weekday(today, target);
    let days_into_week = (today.weekday().num_days_from_sunday() as i64 + 1) % 7;
    let until_next_week = 7 - days_into_week;
    if coming < until_next_week {
        coming + 7
    } else {
        coming
    }
}

fn next_weekday_rule(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let target = first_weekday(caps)?;
    offset(today, days_until_next_week_weekday(today, target))
}

fn coming_weekday_rule(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let target = first_weekday(caps)?;
    offset(today, days_until_weekday(today, target))
}

fn bare_day(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let day = number(caps, 1)?;
    if !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(today.year(), today.month(), day as u32)
}
