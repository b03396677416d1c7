use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::repositories::service_type_repository::{ServiceTypeRepository, ServiceTypeRow};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::catalog::ServiceTypeRecord;
use crate::models::conflict::{
    AvailableSlots, ConflictCheckRequest, ConflictEntry, ConflictResult, ConflictSeverity,
    ConflictType,
};
use crate::models::rules::SchedulingRules;
use crate::models::slot::{TimeSpan, DEFAULT_SLOT_DURATION_MINUTES};
use crate::services::alternative_finder;
use crate::services::availability;
use crate::services::slot_calendar;
use crate::services::staff_oracle::{RosterStaffOracle, StaffAvailabilityOracle};

/// 每个预约占用的人力单位。
const REQUIRED_STAFF_UNITS: u32 = 1;

/// 预约冲突检查的聚合入口,规则在构造时注入,检查期间只读。
#[derive(Clone)]
pub struct ConflictService {
    db: DbPool,
    rules: Arc<SchedulingRules>,
    staff: Arc<dyn StaffAvailabilityOracle>,
}

impl ConflictService {
    pub fn new(db: DbPool, rules: SchedulingRules) -> AppResult<Self> {
        let staff = Arc::new(RosterStaffOracle::new(db.clone()));
        Self::with_staff_oracle(db, rules, staff)
    }

    /// 换用自定义人力判定,排班之外的来源(或测试桩)由此接入。
    pub fn with_staff_oracle(
        db: DbPool,
        rules: SchedulingRules,
        staff: Arc<dyn StaffAvailabilityOracle>,
    ) -> AppResult<Self> {
        rules.validate()?;
        Ok(Self {
            db,
            rules: Arc::new(rules),
            staff,
        })
    }

    pub fn rules(&self) -> &SchedulingRules {
        &self.rules
    }

    /// 依序执行封锁日、营业时间、休息时段与资源检查,汇总冲突与可改约候选。
    ///
    /// 本方法只读不写;调用方拿到无冲突结果后,落库时仍需依赖唯一索引或外部锁串行化。
    pub fn check_conflicts(&self, request: &ConflictCheckRequest) -> AppResult<ConflictResult> {
        if let Some(blocked) = slot_calendar::is_date_blocked(request.date, &self.rules) {
            info!(
                target: "app::conflict",
                date = %request.date,
                reason = %blocked.reason,
                "booking date is blocked"
            );
            let conflict = ConflictEntry {
                conflict_type: ConflictType::TimeSlotFull,
                booking_id: None,
                message: format!("该日期不可预约: {}", blocked.reason),
                severity: ConflictSeverity::High,
                suggested_alternatives: Vec::new(),
            };
            let alternatives = alternative_finder::find_alternative_dates(
                self,
                request,
                alternative_finder::BLOCKED_DATE_HORIZON_DAYS,
            )?;
            return Ok(ConflictResult::flagged(vec![conflict], alternatives));
        }

        if !slot_calendar::is_within_working_hours(&request.time_slot, &self.rules)? {
            let conflict = ConflictEntry {
                conflict_type: ConflictType::TimeSlotFull,
                booking_id: None,
                message: "所选时间不在营业时间内".to_string(),
                severity: ConflictSeverity::Medium,
                suggested_alternatives: Vec::new(),
            };
            let alternatives = alternative_finder::same_day_alternatives(self, request)?;
            return Ok(ConflictResult::flagged(vec![conflict], alternatives));
        }

        if slot_calendar::is_during_break(&request.time_slot, &self.rules)? {
            let conflict = ConflictEntry {
                conflict_type: ConflictType::TimeSlotFull,
                booking_id: None,
                message: "所选时间处于休息时段".to_string(),
                severity: ConflictSeverity::Medium,
                suggested_alternatives: Vec::new(),
            };
            let alternatives = alternative_finder::same_day_alternatives(self, request)?;
            return Ok(ConflictResult::flagged(vec![conflict], alternatives));
        }

        let conflicts = self.resource_conflicts(request)?;
        if conflicts.is_empty() {
            debug!(
                target: "app::conflict",
                date = %request.date,
                time_slot = %request.time_slot,
                "slot is clear"
            );
            return Ok(ConflictResult::clear());
        }

        let alternatives = alternative_finder::find_alternatives(self, request)?;
        info!(
            target: "app::conflict",
            date = %request.date,
            time_slot = %request.time_slot,
            conflicts = conflicts.len(),
            alternatives = alternatives.len(),
            "conflicts detected"
        );
        Ok(ConflictResult::flagged(conflicts, alternatives))
    }

    /// 资源维度的原子检查(车辆、服务并发、单日总量、人力),不做候选搜索。
    ///
    /// 候选搜索会反复调用本方法探测时段,因此这里不得再触发候选搜索。
    pub fn resource_conflicts(&self, request: &ConflictCheckRequest) -> AppResult<Vec<ConflictEntry>> {
        let buffer = self.buffer_minutes(request)?;

        let (requested, mut conflicts) = self.db.with_connection(|conn| {
            let service_types = resolve_service_types(conn, &request.service_type_ids)?;
            let requested = requested_span(request, &service_types)?;

            let mut conflicts = Vec::new();
            if let Some(vehicle_id) = request.vehicle_id.as_deref() {
                conflicts.extend(availability::vehicle_conflicts(
                    conn, &self.rules, request, vehicle_id, requested, buffer,
                )?);
            }
            if !service_types.is_empty() {
                conflicts.extend(availability::service_capacity_conflicts(
                    conn,
                    &self.rules,
                    request,
                    &service_types,
                    requested,
                    buffer,
                )?);
            }
            conflicts.extend(availability::daily_volume_conflicts(conn, &self.rules, request)?);
            Ok((requested, conflicts))
        })?;

        conflicts.extend(availability::staff_conflicts(
            self.staff.as_ref(),
            request,
            requested,
            REQUIRED_STAFF_UNITS,
        )?);

        Ok(conflicts)
    }

    /// 查询某天可预约的时段;封锁日返回空列表并附原因。
    pub fn get_available_time_slots(
        &self,
        date: NaiveDate,
        service_type_ids: &[String],
        exclude_booking_id: Option<&str>,
    ) -> AppResult<AvailableSlots> {
        if let Some(blocked) = slot_calendar::is_date_blocked(date, &self.rules) {
            return Ok(AvailableSlots {
                time_slots: Vec::new(),
                reason: Some(format!("该日期不可预约: {}", blocked.reason)),
            });
        }

        let probe = ConflictCheckRequest {
            vehicle_id: None,
            service_type_ids: service_type_ids.to_vec(),
            date,
            time_slot: self.rules.working_hours.start.clone(),
            exclude_booking_id: exclude_booking_id.map(str::to_string),
            buffer_minutes: None,
        };
        let time_slots = self.probe_available_slots(&probe, date)?;
        debug!(
            target: "app::alternatives",
            %date,
            count = time_slots.len(),
            "available slots probed"
        );
        Ok(AvailableSlots {
            time_slots,
            reason: None,
        })
    }

    /// 在指定日期上逐个时段探测,保留资源检查为空的时段。
    pub(crate) fn probe_available_slots(
        &self,
        request: &ConflictCheckRequest,
        date: NaiveDate,
    ) -> AppResult<Vec<String>> {
        let mut available = Vec::new();
        for slot in slot_calendar::generate_time_slots(&self.rules)? {
            let mut candidate = request.clone();
            candidate.date = date;
            candidate.time_slot = slot;
            if self.resource_conflicts(&candidate)?.is_empty() {
                available.push(candidate.time_slot);
            }
        }
        Ok(available)
    }

    fn buffer_minutes(&self, request: &ConflictCheckRequest) -> AppResult<i64> {
        match request.buffer_minutes {
            Some(buffer) if buffer < 0 => Err(AppError::validation("缓冲分钟数不能为负")),
            Some(buffer) => Ok(buffer),
            None => Ok(self.rules.min_buffer_minutes),
        }
    }
}

fn resolve_service_types(
    conn: &Connection,
    service_type_ids: &[String],
) -> AppResult<Vec<ServiceTypeRecord>> {
    service_type_ids
        .iter()
        .map(|id| {
            ServiceTypeRepository::find_by_id(conn, id)?
                .map(ServiceTypeRow::into_record)
                .ok_or_else(|| AppError::missing_entity("服务项目", id.clone()))
        })
        .collect()
}

/// 请求的占用区间:服务项目时长之和,无服务项目时按默认一小时。
fn requested_span(
    request: &ConflictCheckRequest,
    service_types: &[ServiceTypeRecord],
) -> AppResult<TimeSpan> {
    let total: i64 = if service_types.is_empty() {
        DEFAULT_SLOT_DURATION_MINUTES
    } else {
        service_types.iter().map(|s| s.duration_minutes).sum()
    };
    TimeSpan::from_slot(&request.time_slot, total)
}
