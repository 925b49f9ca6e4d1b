use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::board::Board;

/// Which heuristic produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Today,
    Tomorrow,
    MonthDay,
    Numeric,
    WeekdayName,
}

/// One recognized temporal reference in a piece of text, resolved to a
/// concrete calendar date (no time-of-day component by construction).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch {
    pub kind: MatchKind,
    pub date: NaiveDate,
}

/// Scans every todo across both rows and returns the union of all dates
/// referenced anywhere. `reference` anchors year resolution for explicit
/// month/day mentions (the calendar's displayed month); `today` anchors the
/// relative keywords and weekday lookahead. Pure: never touches the board,
/// never fails, whatever the text contains.
pub fn infer(board: &Board, reference: NaiveDate, today: NaiveDate) -> BTreeSet<NaiveDate> {
    let mut dates = BTreeSet::new();
    for section in board.sections() {
        for todo in &section.todos {
            for found in scan_text(&todo.text, reference, today) {
                dates.insert(found.date);
            }
        }
    }
    dates
}

/// All temporal references in a single piece of text. Categories are
/// independent; one text may contribute matches from several of them.
pub fn scan_text(text: &str, reference: NaiveDate, today: NaiveDate) -> Vec<DateMatch> {
    let text = text.to_lowercase();
    let mut matches = Vec::new();

    if text.contains("today") {
        matches.push(DateMatch {
            kind: MatchKind::Today,
            date: today,
        });
    }
    if text.contains("tomorrow") {
        matches.push(DateMatch {
            kind: MatchKind::Tomorrow,
            date: today + Duration::days(1),
        });
    }

    scan_month_day(&text, reference, &mut matches);
    scan_numeric(&text, reference, &mut matches);
    scan_weekdays(&text, today, &mut matches);

    matches
}

/// "dec 15", "December 15th": resolved in the reference year and, to
/// tolerate a month already past, the following year as well.
fn scan_month_day(text: &str, reference: NaiveDate, matches: &mut Vec<DateMatch>) {
    for caps in month_day_re().captures_iter(text) {
        let Some(month) = caps.get(1).and_then(|m| month_number(m.as_str())) else {
            continue;
        };
        let Some(day) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        if !(1..=31).contains(&day) {
            continue;
        }
        for year in [reference.year(), reference.year() + 1] {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                matches.push(DateMatch {
                    kind: MatchKind::MonthDay,
                    date,
                });
            }
        }
    }
}

/// "12/15", "12-15", "1/5/26", "1/5/2026". Two-digit years map to 2000+YY;
/// a missing year defaults to the reference year. A first number above 12
/// with a second at or below 12 is read day-first and swapped.
fn scan_numeric(text: &str, reference: NaiveDate, matches: &mut Vec<DateMatch>) {
    for caps in numeric_re().captures_iter(text) {
        let Some(first) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        let Some(second) = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };

        let year = match caps.get(3) {
            Some(raw) => match raw.as_str().parse::<i32>() {
                Ok(value) if raw.as_str().len() == 2 => 2000 + value,
                Ok(value) => value,
                Err(_) => continue,
            },
            None => reference.year(),
        };

        let (month, day) = if first > 12 && second <= 12 {
            (second, first)
        } else {
            (first, second)
        };

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            continue;
        }
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            matches.push(DateMatch {
                kind: MatchKind::Numeric,
                date,
            });
        }
    }
}

/// Weekday mentions, full name or 3-letter prefix, by substring containment
/// (matching the behavior users already rely on). Resolves to the next
/// occurrence strictly after `today`; a same-day mention means next week.
fn scan_weekdays(text: &str, today: NaiveDate, matches: &mut Vec<DateMatch>) {
    const WEEKDAYS: [(&str, Weekday); 7] = [
        ("sunday", Weekday::Sun),
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
    ];

    for (name, weekday) in WEEKDAYS {
        if text.contains(name) || text.contains(&name[..3]) {
            matches.push(DateMatch {
                kind: MatchKind::WeekdayName,
                date: next_weekday(today, weekday),
            });
        }
    }
}

/// Next occurrence of `target` strictly after `from`; never `from` itself.
fn next_weekday(from: NaiveDate, target: Weekday) -> NaiveDate {
    let from_idx = from.weekday().num_days_from_monday() as i64;
    let target_idx = target.num_days_from_monday() as i64;
    let mut delta = (7 + target_idx - from_idx) % 7;
    if delta == 0 {
        delta = 7;
    }
    from.checked_add_signed(Duration::days(delta)).unwrap_or(from)
}

fn month_number(name: &str) -> Option<u32> {
    match name {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

fn month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec)\s+(\d{1,2})(?:st|nd|rd|th)?",
        )
        .expect("month-day pattern compiles")
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})[/\-](\d{1,2})(?:[/\-](\d{2,4}))?\b")
            .expect("numeric date pattern compiles")
    })
}
