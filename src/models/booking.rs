use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingKind {
    TestDrive,
    Service,
}

impl BookingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingKind::TestDrive => "TEST_DRIVE",
            BookingKind::Service => "SERVICE",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "TEST_DRIVE" => Some(BookingKind::TestDrive),
            "SERVICE" => Some(BookingKind::Service),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            "COMPLETED" => Some(BookingStatus::Completed),
            "NO_SHOW" => Some(BookingStatus::NoShow),
            _ => None,
        }
    }

    /// 只有待确认与已确认的预约会占用时段。
    pub fn blocks_slot(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    pub kind: BookingKind,
    pub vehicle_id: Option<String>,
    pub service_type_id: Option<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: BookingStatus,
    pub customer_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BookingRecord {
    pub fn new(
        kind: BookingKind,
        vehicle_id: Option<String>,
        service_type_id: Option<String>,
        date: NaiveDate,
        time_slot: impl Into<String>,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            vehicle_id,
            service_type_id,
            date,
            time_slot: time_slot.into(),
            status: BookingStatus::Pending,
            customer_name: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
