use tracing::debug;

use crate::error::AppResult;
use crate::models::conflict::{ConflictCheckRequest, DayAlternatives, MAX_ALTERNATIVES};
use crate::services::conflict_service::ConflictService;
use crate::services::slot_calendar;

pub const DATE_HORIZON_DAYS: i64 = 3;
pub const BLOCKED_DATE_HORIZON_DAYS: i64 = 7;

/// 汇总可改约候选:先收当日剩余时段,再向后扫描工作日,总数不超过上限。
///
/// 探测一律走资源检查原语,避免候选搜索再次进入完整检查。
pub fn find_alternatives(
    service: &ConflictService,
    request: &ConflictCheckRequest,
) -> AppResult<Vec<DayAlternatives>> {
    let mut days = same_day_alternatives(service, request)?;
    days.extend(find_alternative_dates(service, request, DATE_HORIZON_DAYS)?);
    days.truncate(MAX_ALTERNATIVES);
    debug!(
        target: "app::alternatives",
        date = %request.date,
        days = days.len(),
        "alternatives assembled"
    );
    Ok(days)
}

pub fn same_day_alternatives(
    service: &ConflictService,
    request: &ConflictCheckRequest,
) -> AppResult<Vec<DayAlternatives>> {
    let slots = service.probe_available_slots(request, request.date)?;
    if slots.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![DayAlternatives {
        date: request.date,
        time_slots: slots,
        reason: "当日仍有空闲时段".to_string(),
    }])
}

/// 从次日起扫描 days_ahead 天,跳过周末与封锁日,保留有空闲时段的日期。
pub fn find_alternative_dates(
    service: &ConflictService,
    request: &ConflictCheckRequest,
    days_ahead: i64,
) -> AppResult<Vec<DayAlternatives>> {
    let mut days = Vec::new();
    for date in slot_calendar::upcoming_open_dates(service.rules(), request.date, days_ahead) {
        let slots = service.probe_available_slots(request, date)?;
        if slots.is_empty() {
            continue;
        }
        days.push(DayAlternatives {
            date,
            time_slots: slots,
            reason: slot_calendar::weekday_label(date),
        });
    }
    Ok(days)
}
