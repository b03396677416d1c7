use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MAX_ALTERNATIVES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictType {
    VehicleUnavailable,
    ServiceOverlap,
    StaffUnavailable,
    TimeSlotFull,
}

impl ConflictType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictType::VehicleUnavailable => "VEHICLE_UNAVAILABLE",
            ConflictType::ServiceOverlap => "SERVICE_OVERLAP",
            ConflictType::StaffUnavailable => "STAFF_UNAVAILABLE",
            ConflictType::TimeSlotFull => "TIME_SLOT_FULL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

/// 单条冲突检查请求,随调用构造,不落库。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckRequest {
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub service_type_ids: Vec<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    #[serde(default)]
    pub exclude_booking_id: Option<String>,
    #[serde(default)]
    pub buffer_minutes: Option<i64>,
}

impl ConflictCheckRequest {
    pub fn test_drive(vehicle_id: impl Into<String>, date: NaiveDate, time_slot: impl Into<String>) -> Self {
        Self {
            vehicle_id: Some(vehicle_id.into()),
            service_type_ids: Vec::new(),
            date,
            time_slot: time_slot.into(),
            exclude_booking_id: None,
            buffer_minutes: None,
        }
    }

    pub fn service(service_type_ids: Vec<String>, date: NaiveDate, time_slot: impl Into<String>) -> Self {
        Self {
            vehicle_id: None,
            service_type_ids,
            date,
            time_slot: time_slot.into(),
            exclude_booking_id: None,
            buffer_minutes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotSuggestion {
    pub date: NaiveDate,
    pub time_slot: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    pub conflict_type: ConflictType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub message: String,
    pub severity: ConflictSeverity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_alternatives: Vec<SlotSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayAlternatives {
    pub date: NaiveDate,
    pub time_slots: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictEntry>,
    pub available_alternatives: Vec<DayAlternatives>,
}

impl ConflictResult {
    pub fn clear() -> Self {
        Self {
            has_conflicts: false,
            conflicts: Vec::new(),
            available_alternatives: Vec::new(),
        }
    }

    /// 组装检查结果并维持约束:无冲突时不携带候选,候选最多 5 天且每天至少一个可用时段。
    pub fn flagged(conflicts: Vec<ConflictEntry>, alternatives: Vec<DayAlternatives>) -> Self {
        if conflicts.is_empty() {
            return Self::clear();
        }
        let available_alternatives = alternatives
            .into_iter()
            .filter(|day| !day.time_slots.is_empty())
            .take(MAX_ALTERNATIVES)
            .collect();
        Self {
            has_conflicts: true,
            conflicts,
            available_alternatives,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlots {
    pub time_slots: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingPriority {
    Low,
    Medium,
    High,
}

impl BookingPriority {
    pub fn weight(self) -> u8 {
        match self {
            BookingPriority::Low => 1,
            BookingPriority::Medium => 2,
            BookingPriority::High => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingBooking {
    pub id: String,
    pub request: ConflictCheckRequest,
    pub priority: BookingPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedSlot {
    pub date: NaiveDate,
    pub time_slot: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationOutcome {
    pub booking: PendingBooking,
    pub optimized: OptimizedSlot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<String>,
}
