//! Forecast periods and what the dashboard derives from them: per-day
//! aggregates, the periods of one day and upcoming precipitation messages

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};

use super::api::{ConditionBlock, ForecastEntry, VolumeBlock};
use crate::constants::forecast::{MM_PER_INCH, PRECIP_WINDOW_HOURS};
use crate::pretty::{pretty_length, pretty_relative_datetime, pretty_weekday};

/// Length of one forecast period
pub const PERIOD_HOURS: i64 = 3;

pub const NO_PRECIPITATION: &str = "No precipitation expected";

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Condition group, e.g. `Rain`
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    pub fn from_blocks(blocks: &[ConditionBlock]) -> Self {
        blocks
            .first()
            .map(|block| Self {
                main: block.main.clone(),
                description: block.description.clone(),
                icon: block.icon.clone(),
            })
            .unwrap_or_else(|| Self {
                main: "Unknown".to_string(),
                description: "unknown".to_string(),
                icon: "01d".to_string(),
            })
    }

    /// Description with its first letter capitalised
    pub fn label(&self) -> String {
        let mut chars = self.description.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => self.main.clone(),
        }
    }

    /// Same condition with the daytime icon variant (`10n` → `10d`)
    pub fn daytime(&self) -> Self {
        let icon = match self.icon.strip_suffix('n') {
            Some(code) => format!("{code}d"),
            None => self.icon.clone(),
        };
        Self {
            icon,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precipitation {
    Rain,
    Snow,
}

impl Precipitation {
    pub const ALL: [Precipitation; 2] = [Precipitation::Rain, Precipitation::Snow];

    pub fn name(self) -> &'static str {
        match self {
            Precipitation::Rain => "Rain",
            Precipitation::Snow => "Snow",
        }
    }
}

/// One 3-hour forecast bucket. Precipitation is in inches.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub time: DateTime<FixedOffset>,
    pub temp: f64,
    pub condition: Condition,
    pub rain: f64,
    pub snow: f64,
}

fn inches(volume: Option<&VolumeBlock>) -> f64 {
    volume.map_or(0.0, |volume| volume.millimetres() / MM_PER_INCH)
}

impl Period {
    /// Convert a provider entry into local time and inches. `None` when the
    /// timestamp is out of range.
    pub fn from_entry(entry: &ForecastEntry, offset: FixedOffset) -> Option<Self> {
        Some(Self {
            time: offset.timestamp_opt(entry.dt, 0).single()?,
            temp: entry.main.temp,
            condition: Condition::from_blocks(&entry.weather),
            rain: inches(entry.rain.as_ref()),
            snow: inches(entry.snow.as_ref()),
        })
    }

    pub fn amount(&self, kind: Precipitation) -> f64 {
        match kind {
            Precipitation::Rain => self.rain,
            Precipitation::Snow => self.snow,
        }
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.time + Duration::hours(PERIOD_HOURS)
    }

    /// `Rain 0.12"`, or `None` when there is none
    pub fn precip_text(&self, kind: Precipitation) -> Option<String> {
        precip_text(kind, self.amount(kind))
    }
}

fn precip_text(kind: Precipitation, inches: f64) -> Option<String> {
    pretty_length(inches).map(|length| format!("{} {length}", kind.name()))
}

/// Conditions right now
#[derive(Debug, Clone, PartialEq)]
pub struct Current {
    pub time: DateTime<FixedOffset>,
    pub temp: f64,
    pub condition: Condition,
}

/// Summary of every period falling on one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayAggregate {
    pub date: NaiveDate,
    pub low: f64,
    pub high: f64,
    pub rain: f64,
    pub snow: f64,
    /// Most frequent condition, with its daytime icon
    pub condition: Condition,
}

impl DayAggregate {
    pub fn weekday(&self) -> String {
        let noon = self.date.and_hms_opt(12, 0, 0).map(|dt| dt.and_utc());
        noon.map(|dt| pretty_weekday(&dt)).unwrap_or_default()
    }

    pub fn amount(&self, kind: Precipitation) -> f64 {
        match kind {
            Precipitation::Rain => self.rain,
            Precipitation::Snow => self.snow,
        }
    }

    /// Non-empty precipitation lines, rain first, so a snow-only day leaves no gap
    pub fn precip_lines(&self) -> Vec<String> {
        Precipitation::ALL
            .iter()
            .filter_map(|&kind| precip_text(kind, self.amount(kind)))
            .collect()
    }
}

/// Most frequent `main` condition; ties go to whichever appeared first
fn dominant_condition<'a>(periods: impl Iterator<Item = &'a Period>) -> Option<Condition> {
    let mut counts: Vec<(&Condition, usize)> = Vec::new();
    for period in periods {
        match counts
            .iter_mut()
            .find(|(condition, _)| condition.main == period.condition.main)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((&period.condition, 1)),
        }
    }

    let mut best: Option<(&Condition, usize)> = None;
    for (condition, count) in counts {
        if best.is_none_or(|(_, most)| count > most) {
            best = Some((condition, count));
        }
    }
    best.map(|(condition, _)| condition.daytime())
}

fn aggregate(date: NaiveDate, periods: &[&Period]) -> Option<DayAggregate> {
    let condition = dominant_condition(periods.iter().copied())?;
    let temps = periods.iter().map(|period| period.temp);
    Some(DayAggregate {
        date,
        low: temps.clone().fold(f64::INFINITY, f64::min),
        high: temps.fold(f64::NEG_INFINITY, f64::max),
        rain: periods.iter().map(|period| period.rain).sum(),
        snow: periods.iter().map(|period| period.snow).sum(),
        condition,
    })
}

/// Group `periods` (in time order) by calendar day in their own offset.
///
/// With `current`, the first aggregate is always the current day and its
/// low/high include the current temperature, even once no periods remain
/// for it.
pub fn aggregate_days(periods: &[Period], current: Option<&Current>) -> Vec<DayAggregate> {
    let mut groups: Vec<(NaiveDate, Vec<&Period>)> = Vec::new();
    for period in periods {
        let date = period.time.date_naive();
        match groups.last_mut() {
            Some((last, group)) if *last == date => group.push(period),
            _ => groups.push((date, vec![period])),
        }
    }

    let mut days: Vec<DayAggregate> = groups
        .iter()
        .filter_map(|(date, group)| aggregate(*date, group))
        .collect();

    if let Some(current) = current {
        let today = current.time.date_naive();
        match days.first_mut() {
            Some(first) if first.date == today => {
                first.low = first.low.min(current.temp);
                first.high = first.high.max(current.temp);
            }
            _ => days.insert(
                0,
                DayAggregate {
                    date: today,
                    low: current.temp,
                    high: current.temp,
                    rain: 0.0,
                    snow: 0.0,
                    condition: current.condition.daytime(),
                },
            ),
        }
    }

    days
}

/// Periods of `day`, or the ones still ahead today when `day` is `None`.
/// `None` when there are none left to show.
pub fn periods_by_day(
    periods: &[Period],
    day: Option<NaiveDate>,
    now: DateTime<FixedOffset>,
) -> Option<Vec<Period>> {
    let selected: Vec<Period> = match day {
        Some(date) => periods
            .iter()
            .filter(|period| period.time.date_naive() == date)
            .cloned()
            .collect(),
        None => periods
            .iter()
            .filter(|period| period.time.date_naive() == now.date_naive() && period.end() > now)
            .cloned()
            .collect(),
    };
    (!selected.is_empty()).then_some(selected)
}

/// One message per precipitation kind expected in the next 24 hours,
/// describing the first consecutive run of wet periods
pub fn upcoming_precip_messages(periods: &[Period], now: DateTime<FixedOffset>) -> Vec<String> {
    let horizon = now + Duration::hours(PRECIP_WINDOW_HOURS);
    let window: Vec<&Period> = periods
        .iter()
        .filter(|period| period.end() > now && period.time < horizon)
        .collect();

    let messages: Vec<String> = Precipitation::ALL
        .iter()
        .filter_map(|&kind| {
            let start = window.iter().position(|period| period.amount(kind) > 0.0)?;
            let run: Vec<&Period> = window[start..]
                .iter()
                .take_while(|period| period.amount(kind) > 0.0)
                .copied()
                .collect();
            let first = run.first()?;
            let last = run.last()?;
            let total: f64 = run.iter().map(|period| period.amount(kind)).sum();
            let total = pretty_length(total)?;

            Some(if first.time <= now {
                format!(
                    "{} until {}, {total} expected",
                    kind.name(),
                    pretty_relative_datetime(&last.end())
                )
            } else {
                format!(
                    "{} starting {}, {total} expected",
                    kind.name(),
                    pretty_relative_datetime(&first.time)
                )
            })
        })
        .collect();

    if messages.is_empty() {
        vec![NO_PRECIPITATION.to_string()]
    } else {
        messages
    }
}
