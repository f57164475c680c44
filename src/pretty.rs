//! Display formatting for dates, times, temperatures and lengths

use std::fmt::Display;

use chrono::{DateTime, Datelike, TimeZone, Timelike};

/// Whole degrees, e.g. `45°`
pub fn pretty_temp(degrees: f64) -> String {
    format!("{degrees:.0}°")
}

/// Inches with two decimals, `None` for nothing at all
pub fn pretty_length(inches: f64) -> Option<String> {
    if inches == 0.0 {
        return None;
    }
    Some(format!("{inches:.2}\""))
}

pub fn pretty_date_str<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format("%m/%d/%Y %I:%M:%S %p").to_string()
}

pub fn pretty_date_only_str<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format("%m/%d/%Y").to_string()
}

pub fn pretty_time_str<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format("%I:%M:%S %p").to_string()
}

/// Hour only, e.g. `3 PM`
pub fn pretty_time_str_short<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    dt.format("%-I %p").to_string()
}

pub fn pretty_weekday<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    weekday_name(dt.weekday()).to_string()
}

/// Weekday plus a coarse part of the day, e.g. `Tuesday evening`
pub fn pretty_relative_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let part = match dt.hour() {
        0..6 => "early morning",
        6..12 => "morning",
        12..18 => "afternoon",
        18..21 => "evening",
        _ => "night",
    };
    format!("{} {part}", weekday_name(dt.weekday()))
}

fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    use chrono::Weekday::*;
    match weekday {
        Mon => "Monday",
        Tue => "Tuesday",
        Wed => "Wednesday",
        Thu => "Thursday",
        Fri => "Friday",
        Sat => "Saturday",
        Sun => "Sunday",
    }
}
