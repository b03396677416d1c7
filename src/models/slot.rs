use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// 预约未关联任何服务项目时采用的默认时长(分钟)。
pub const DEFAULT_SLOT_DURATION_MINUTES: i64 = 60;

/// 解析 "HH:mm" 为当日零点起的分钟数。
pub fn parse_slot(value: &str) -> AppResult<i64> {
    let trimmed = value.trim();
    let (hours_raw, minutes_raw) = trimmed.split_once(':').ok_or_else(|| {
        AppError::validation_with_details("时间格式应为 HH:mm", json!({"value": value}))
    })?;

    let hours: i64 = hours_raw.parse().map_err(|_| {
        AppError::validation_with_details("时间格式应为 HH:mm", json!({"value": value}))
    })?;
    let minutes: i64 = minutes_raw.parse().map_err(|_| {
        AppError::validation_with_details("时间格式应为 HH:mm", json!({"value": value}))
    })?;

    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(AppError::validation_with_details(
            "时间取值超出范围",
            json!({"value": value}),
        ));
    }

    Ok(hours * 60 + minutes)
}

pub fn format_slot(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// 半开分钟区间 [start, end)，用于时段重叠判断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    pub start: i64,
    pub end: i64,
}

impl TimeSpan {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn from_slot(slot: &str, duration_minutes: i64) -> AppResult<Self> {
        if duration_minutes <= 0 {
            return Err(AppError::validation("时长需大于 0"));
        }
        let start = parse_slot(slot)?;
        Ok(Self {
            start,
            end: start + duration_minutes,
        })
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// 两侧各扩展 buffer 分钟，用于落实最小间隔。
    pub fn expand(&self, buffer_minutes: i64) -> TimeSpan {
        TimeSpan {
            start: self.start - buffer_minutes,
            end: self.end + buffer_minutes,
        }
    }

    pub fn contains(&self, minute: i64) -> bool {
        self.start <= minute && minute < self.end
    }
}
