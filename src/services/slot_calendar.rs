use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::trace;

use crate::error::AppResult;
use crate::models::rules::{BlockedDate, SchedulingRules};
use crate::models::slot::{format_slot, parse_slot, TimeSpan};

pub const SLOT_GRANULARITY_MINUTES: i64 = 60;

/// 生成当日可预约时段:整点粒度,剔除与休息时段相交的起点。
pub fn generate_time_slots(rules: &SchedulingRules) -> AppResult<Vec<String>> {
    let open = parse_slot(&rules.working_hours.start)?;
    let close = parse_slot(&rules.working_hours.end)?;
    let breaks = break_spans(rules)?;

    let mut slots = Vec::new();
    let mut minute = open;
    while minute < close {
        let candidate = TimeSpan::new(minute, minute + SLOT_GRANULARITY_MINUTES);
        if !breaks.iter().any(|window| window.overlaps(&candidate)) {
            slots.push(format_slot(minute));
        }
        minute += SLOT_GRANULARITY_MINUTES;
    }

    trace!(target: "app::calendar", count = slots.len(), "time slots generated");
    Ok(slots)
}

pub fn is_within_working_hours(slot: &str, rules: &SchedulingRules) -> AppResult<bool> {
    let minute = parse_slot(slot)?;
    let open = parse_slot(&rules.working_hours.start)?;
    let close = parse_slot(&rules.working_hours.end)?;
    Ok(minute >= open && minute < close)
}

pub fn is_during_break(slot: &str, rules: &SchedulingRules) -> AppResult<bool> {
    let minute = parse_slot(slot)?;
    let breaks = break_spans(rules)?;
    Ok(breaks.iter().any(|window| window.contains(minute)))
}

pub fn is_date_blocked<'a>(date: NaiveDate, rules: &'a SchedulingRules) -> Option<&'a BlockedDate> {
    rules.blocked_dates.iter().find(|blocked| blocked.date == date)
}

/// 从 from 之后一天开始,给出 days_ahead 天内可对外开放的日期(跳过周末与封锁日)。
pub fn upcoming_open_dates(
    rules: &SchedulingRules,
    from: NaiveDate,
    days_ahead: i64,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    for offset in 1..=days_ahead {
        let date = from + Duration::days(offset);
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        if is_date_blocked(date, rules).is_some() {
            continue;
        }
        dates.push(date);
    }
    dates
}

pub fn weekday_label(date: NaiveDate) -> String {
    let weekday = match date.weekday() {
        Weekday::Mon => "星期一",
        Weekday::Tue => "星期二",
        Weekday::Wed => "星期三",
        Weekday::Thu => "星期四",
        Weekday::Fri => "星期五",
        Weekday::Sat => "星期六",
        Weekday::Sun => "星期日",
    };
    format!("{} ({})", weekday, date)
}

fn break_spans(rules: &SchedulingRules) -> AppResult<Vec<TimeSpan>> {
    rules
        .break_times
        .iter()
        .map(|window| {
            Ok(TimeSpan::new(
                parse_slot(&window.start)?,
                parse_slot(&window.end)?,
            ))
        })
        .collect()
}
