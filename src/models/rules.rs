use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::slot::parse_slot;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreakWindow {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedDate {
    pub date: NaiveDate,
    pub reason: String,
}

/// 门店排程规则,进程启动时装载一次,检查期间只读。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRules {
    pub max_concurrent_bookings: u32,
    pub min_buffer_minutes: i64,
    pub max_bookings_per_day: u32,
    pub working_hours: WorkingHours,
    #[serde(default)]
    pub break_times: Vec<BreakWindow>,
    #[serde(default)]
    pub blocked_dates: Vec<BlockedDate>,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            max_concurrent_bookings: 3,
            min_buffer_minutes: 15,
            max_bookings_per_day: 12,
            working_hours: WorkingHours {
                start: "08:00".to_string(),
                end: "18:00".to_string(),
            },
            break_times: vec![BreakWindow {
                start: "12:00".to_string(),
                end: "13:00".to_string(),
            }],
            blocked_dates: Vec::new(),
        }
    }
}

impl SchedulingRules {
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let rules: Self = serde_json::from_str(&raw)?;
        rules.validate()?;
        debug!(target: "app::rules", path = %path.display(), "scheduling rules loaded");
        Ok(rules)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_concurrent_bookings == 0 {
            return Err(AppError::validation("并发预约上限需大于 0"));
        }
        if self.max_bookings_per_day == 0 {
            return Err(AppError::validation("单日预约上限需大于 0"));
        }
        if self.min_buffer_minutes < 0 {
            return Err(AppError::validation("缓冲分钟数不能为负"));
        }

        let open = parse_slot(&self.working_hours.start)?;
        let close = parse_slot(&self.working_hours.end)?;
        if close <= open {
            return Err(AppError::validation("营业结束时间必须晚于开始时间"));
        }

        for window in &self.break_times {
            let start = parse_slot(&window.start)?;
            let end = parse_slot(&window.end)?;
            if end <= start {
                return Err(AppError::validation("休息时段结束时间必须晚于开始时间"));
            }
            if start < open || end > close {
                return Err(AppError::validation("休息时段必须位于营业时间内"));
            }
        }

        let mut seen = HashSet::new();
        for blocked in &self.blocked_dates {
            if !seen.insert(blocked.date) {
                return Err(AppError::validation(format!(
                    "封锁日期重复: {}",
                    blocked.date
                )));
            }
        }

        Ok(())
    }
}
