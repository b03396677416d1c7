use rusqlite::Connection;
use tracing::debug;

use crate::db::repositories::booking_repository::{ActiveBooking, BookingRepository};
use crate::db::repositories::vehicle_repository::VehicleRepository;
use crate::error::{AppError, AppResult};
use crate::models::catalog::{ServiceTypeRecord, VehicleStatus};
use crate::models::conflict::{
    ConflictCheckRequest, ConflictEntry, ConflictSeverity, ConflictType, SlotSuggestion,
};
use crate::models::rules::SchedulingRules;
use crate::models::slot::{TimeSpan, DEFAULT_SLOT_DURATION_MINUTES};
use crate::services::slot_calendar;
use crate::services::staff_oracle::StaffAvailabilityOracle;

const MAX_SLOT_SUGGESTIONS: usize = 3;
const MAX_DATE_SUGGESTIONS: usize = 3;
const DATE_SUGGESTION_SCAN_DAYS: i64 = 7;

/// 车辆维度检查:车辆必须存在、状态可用,且请求时段(含缓冲)与已有预约不重叠。
pub fn vehicle_conflicts(
    conn: &Connection,
    rules: &SchedulingRules,
    request: &ConflictCheckRequest,
    vehicle_id: &str,
    requested: TimeSpan,
    buffer_minutes: i64,
) -> AppResult<Vec<ConflictEntry>> {
    let vehicle = VehicleRepository::find_by_id(conn, vehicle_id)?
        .ok_or_else(|| AppError::missing_entity("车辆", vehicle_id))?
        .into_record()?;

    if vehicle.status != VehicleStatus::Available {
        debug!(
            target: "app::conflict",
            vehicle_id,
            status = vehicle.status.as_str(),
            "vehicle not bookable"
        );
        return Ok(vec![ConflictEntry {
            conflict_type: ConflictType::VehicleUnavailable,
            booking_id: None,
            message: format!(
                "车辆 {} 当前{},暂不可预约",
                vehicle.model,
                vehicle_status_label(vehicle.status)
            ),
            severity: ConflictSeverity::High,
            suggested_alternatives: Vec::new(),
        }]);
    }

    let active = BookingRepository::list_active_for_vehicle(
        conn,
        vehicle_id,
        request.date,
        request.exclude_booking_id.as_deref(),
    )?;

    let mut clashing: Vec<&ActiveBooking> = Vec::new();
    for booking in &active {
        if booking_span(booking)?.expand(buffer_minutes).overlaps(&requested) {
            clashing.push(booking);
        }
    }

    if clashing.is_empty() {
        return Ok(Vec::new());
    }

    let taken: Vec<&str> = clashing.iter().map(|b| b.time_slot.as_str()).collect();
    let suggestions = slot_suggestions(rules, request, &taken)?;

    let conflicts = clashing
        .iter()
        .map(|booking| ConflictEntry {
            conflict_type: ConflictType::VehicleUnavailable,
            booking_id: Some(booking.id.clone()),
            message: format!("车辆在 {} 已有预约,与所选时段冲突", booking.time_slot),
            severity: ConflictSeverity::High,
            suggested_alternatives: suggestions.clone(),
        })
        .collect::<Vec<_>>();

    debug!(
        target: "app::conflict",
        vehicle_id,
        count = conflicts.len(),
        "vehicle slot clashes found"
    );
    Ok(conflicts)
}

/// 服务项目维度检查:逐项统计与请求时段(含缓冲)重叠的活跃预约数,达到并发上限即冲突。
pub fn service_capacity_conflicts(
    conn: &Connection,
    rules: &SchedulingRules,
    request: &ConflictCheckRequest,
    service_types: &[ServiceTypeRecord],
    requested: TimeSpan,
    buffer_minutes: i64,
) -> AppResult<Vec<ConflictEntry>> {
    let mut conflicts = Vec::new();

    for service_type in service_types {
        let active = BookingRepository::list_active_for_service_type(
            conn,
            &service_type.id,
            request.date,
            request.exclude_booking_id.as_deref(),
        )?;

        let mut taken = Vec::new();
        for booking in &active {
            if booking_span(booking)?.expand(buffer_minutes).overlaps(&requested) {
                taken.push(booking.time_slot.as_str());
            }
        }

        if taken.len() as u32 >= rules.max_concurrent_bookings {
            debug!(
                target: "app::conflict",
                service_type_id = %service_type.id,
                concurrent = taken.len(),
                "service capacity reached"
            );
            conflicts.push(ConflictEntry {
                conflict_type: ConflictType::ServiceOverlap,
                booking_id: None,
                message: format!(
                    "服务项目 {} 在该时段的并发预约已达上限 {}",
                    service_type.name, rules.max_concurrent_bookings
                ),
                severity: ConflictSeverity::Medium,
                suggested_alternatives: slot_suggestions(rules, request, &taken)?,
            });
        }
    }

    Ok(conflicts)
}

/// 单日总量检查:当日活跃预约数达到上限即冲突,附近几个工作日作为候选。
pub fn daily_volume_conflicts(
    conn: &Connection,
    rules: &SchedulingRules,
    request: &ConflictCheckRequest,
) -> AppResult<Vec<ConflictEntry>> {
    let count = BookingRepository::count_active_for_date(
        conn,
        request.date,
        request.exclude_booking_id.as_deref(),
    )?;

    if count < rules.max_bookings_per_day {
        return Ok(Vec::new());
    }

    debug!(
        target: "app::conflict",
        date = %request.date,
        count,
        "daily booking cap reached"
    );

    let suggestions =
        slot_calendar::upcoming_open_dates(rules, request.date, DATE_SUGGESTION_SCAN_DAYS)
            .into_iter()
            .take(MAX_DATE_SUGGESTIONS)
            .map(|date| SlotSuggestion {
                date,
                time_slot: request.time_slot.clone(),
                reason: slot_calendar::weekday_label(date),
            })
            .collect();

    Ok(vec![ConflictEntry {
        conflict_type: ConflictType::TimeSlotFull,
        booking_id: None,
        message: format!("当日预约总数已达上限 {}", rules.max_bookings_per_day),
        severity: ConflictSeverity::High,
        suggested_alternatives: suggestions,
    }])
}

/// 人力维度检查:委托排班判定,无人可接则给出 STAFF_UNAVAILABLE。
pub fn staff_conflicts(
    oracle: &dyn StaffAvailabilityOracle,
    request: &ConflictCheckRequest,
    requested: TimeSpan,
    required_units: u32,
) -> AppResult<Vec<ConflictEntry>> {
    let availability = oracle.check_staff_availability(
        request.date,
        requested,
        required_units,
        request.exclude_booking_id.as_deref(),
    )?;

    if availability.available {
        return Ok(Vec::new());
    }

    Ok(vec![ConflictEntry {
        conflict_type: ConflictType::StaffUnavailable,
        booking_id: None,
        message: availability
            .reason
            .unwrap_or_else(|| "该时段人力不足".to_string()),
        severity: ConflictSeverity::Medium,
        suggested_alternatives: Vec::new(),
    }])
}

fn booking_span(booking: &ActiveBooking) -> AppResult<TimeSpan> {
    let duration = booking
        .duration_minutes
        .unwrap_or(DEFAULT_SLOT_DURATION_MINUTES);
    TimeSpan::from_slot(&booking.time_slot, duration)
}

/// 同日改约候选:跳过已占用的起点与请求本身,不做完整可用性探测。
fn slot_suggestions(
    rules: &SchedulingRules,
    request: &ConflictCheckRequest,
    taken_slots: &[&str],
) -> AppResult<Vec<SlotSuggestion>> {
    let suggestions = slot_calendar::generate_time_slots(rules)?
        .into_iter()
        .filter(|slot| slot != &request.time_slot && !taken_slots.contains(&slot.as_str()))
        .take(MAX_SLOT_SUGGESTIONS)
        .map(|time_slot| SlotSuggestion {
            date: request.date,
            time_slot,
            reason: "同日可改约时段".to_string(),
        })
        .collect();
    Ok(suggestions)
}

fn vehicle_status_label(status: VehicleStatus) -> &'static str {
    match status {
        VehicleStatus::Available => "可预约",
        VehicleStatus::InService => "维修中",
        VehicleStatus::Reserved => "已被预订",
        VehicleStatus::Sold => "已售出",
    }
}
