use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Geometry of one displayed month: weeks run Sunday through Saturday, with
/// blank cells padding the first and last week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Blank cells before day 1 (0 when the month starts on a Sunday).
    pub leading: usize,
    pub days: u32,
}

impl MonthGrid {
    pub fn for_month(year: i32, month: u32) -> anyhow::Result<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| anyhow!("invalid month: {year}-{month:02}"))?;
        let leading = first.weekday().num_days_from_sunday() as usize;
        Ok(Self {
            year,
            month,
            leading,
            days: days_in_month(first),
        })
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn title(&self) -> String {
        let name = MONTH_NAMES
            .get(self.month as usize - 1)
            .copied()
            .unwrap_or("?");
        format!("{} {}", name, self.year)
    }

    /// Day cells padded to whole weeks: `None` outside the month.
    pub fn cells(&self) -> Vec<Option<u32>> {
        let mut cells: Vec<Option<u32>> = vec![None; self.leading];
        cells.extend((1..=self.days).map(Some));
        while cells.len() % 7 != 0 {
            cells.push(None);
        }
        cells
    }

    /// The grid `offset` whole months away, in either direction.
    pub fn shifted(&self, offset: i32) -> anyhow::Result<Self> {
        let zero_based = self.year * 12 + (self.month as i32 - 1) + offset;
        let year = zero_based.div_euclid(12);
        let month = (zero_based.rem_euclid(12) + 1) as u32;
        Self::for_month(year, month)
    }
}

fn days_in_month(first: NaiveDate) -> u32 {
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    match next_month {
        Some(next) => next.signed_duration_since(first).num_days() as u32,
        None => 31,
    }
}

/// Parses a `YYYY-MM` month argument.
pub fn parse_month_arg(raw: &str) -> anyhow::Result<MonthGrid> {
    let (year_raw, month_raw) = raw
        .trim()
        .split_once('-')
        .ok_or_else(|| anyhow!("expected YYYY-MM, got: {raw}"))?;
    let year: i32 = year_raw
        .parse()
        .with_context(|| format!("invalid year in month argument: {raw}"))?;
    let month: u32 = month_raw
        .parse()
        .with_context(|| format!("invalid month in month argument: {raw}"))?;
    MonthGrid::for_month(year, month)
}
