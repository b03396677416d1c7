use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    InService,
    Reserved,
    Sold,
}

impl VehicleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::InService => "IN_SERVICE",
            VehicleStatus::Reserved => "RESERVED",
            VehicleStatus::Sold => "SOLD",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "AVAILABLE" => Some(VehicleStatus::Available),
            "IN_SERVICE" => Some(VehicleStatus::InService),
            "RESERVED" => Some(VehicleStatus::Reserved),
            "SOLD" => Some(VehicleStatus::Sold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: String,
    pub model: String,
    pub status: VehicleStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl VehicleRecord {
    pub fn new(model: impl Into<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            model: model.into(),
            status: VehicleStatus::Available,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeRecord {
    pub id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ServiceTypeRecord {
    pub fn new(name: impl Into<String>, duration_minutes: i64) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            duration_minutes,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Technician,
    Sales,
}

impl StaffRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::Technician => "TECHNICIAN",
            StaffRole::Sales => "SALES",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "TECHNICIAN" => Some(StaffRole::Technician),
            "SALES" => Some(StaffRole::Sales),
            _ => None,
        }
    }
}

/// 排班表中的一个班次,起止时间为 "HH:mm"。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffShiftRecord {
    pub id: String,
    pub staff_name: String,
    pub role: StaffRole,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub created_at: String,
}

impl StaffShiftRecord {
    pub fn new(
        staff_name: impl Into<String>,
        role: StaffRole,
        date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            staff_name: staff_name.into(),
            role,
            date,
            start_time: start_time.into(),
            end_time: end_time.into(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
