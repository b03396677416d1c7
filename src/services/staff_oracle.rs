use chrono::NaiveDate;
use tracing::debug;

use crate::db::repositories::booking_repository::BookingRepository;
use crate::db::repositories::staff_repository::StaffRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::slot::{parse_slot, TimeSpan, DEFAULT_SLOT_DURATION_MINUTES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffAvailability {
    pub available: bool,
    pub reason: Option<String>,
}

impl StaffAvailability {
    pub fn available() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// 人力可用性检查的注入点,便于在测试中替换排班来源。
pub trait StaffAvailabilityOracle: Send + Sync {
    fn check_staff_availability(
        &self,
        date: NaiveDate,
        span: TimeSpan,
        required_units: u32,
        exclude_booking_id: Option<&str>,
    ) -> AppResult<StaffAvailability>;
}

/// 按排班表推算人力:在岗班次须完整覆盖请求时段,再扣除同时段已有预约占用。
#[derive(Clone)]
pub struct RosterStaffOracle {
    db: DbPool,
}

impl RosterStaffOracle {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl StaffAvailabilityOracle for RosterStaffOracle {
    fn check_staff_availability(
        &self,
        date: NaiveDate,
        span: TimeSpan,
        required_units: u32,
        exclude_booking_id: Option<&str>,
    ) -> AppResult<StaffAvailability> {
        self.db.with_connection(|conn| {
            let mut on_duty: u32 = 0;
            for shift in StaffRepository::list_for_date(conn, date)? {
                let start = parse_slot(&shift.start_time)?;
                let end = parse_slot(&shift.end_time)?;
                if start <= span.start && span.end <= end {
                    on_duty += 1;
                }
            }

            let mut committed: u32 = 0;
            for booking in BookingRepository::list_active_for_date(conn, date, exclude_booking_id)? {
                let duration = booking
                    .duration_minutes
                    .unwrap_or(DEFAULT_SLOT_DURATION_MINUTES);
                let existing = TimeSpan::from_slot(&booking.time_slot, duration)?;
                if existing.overlaps(&span) {
                    committed += 1;
                }
            }

            debug!(
                target: "app::staff",
                %date,
                on_duty,
                committed,
                required_units,
                "roster availability computed"
            );

            let free = on_duty.saturating_sub(committed);
            if free >= required_units {
                return Ok(StaffAvailability::available());
            }

            if on_duty == 0 {
                Ok(StaffAvailability::unavailable("该时段无在岗员工"))
            } else {
                Ok(StaffAvailability::unavailable(format!(
                    "在岗 {} 人已被 {} 个预约占用",
                    on_duty, committed
                )))
            }
        })
    }
}
