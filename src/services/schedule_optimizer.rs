use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AppResult;
use crate::models::conflict::{OptimizationOutcome, OptimizedSlot, PendingBooking};
use crate::services::conflict_service::ConflictService;

/// 批量指派:按优先级从高到低逐条检查,可行保留原时段,冲突则改派首个候选。
#[derive(Clone)]
pub struct ScheduleOptimizer {
    conflicts: Arc<ConflictService>,
}

impl ScheduleOptimizer {
    pub fn new(conflicts: Arc<ConflictService>) -> Self {
        Self { conflicts }
    }

    /// 结果按优先级排序,同级保持传入顺序。
    ///
    /// 单轮指派不回写存储,前面的指派不会成为后面请求眼中的占用;
    /// 调用方落库前需对每条结果再做一次冲突检查。
    pub fn optimize_schedule(
        &self,
        requests: Vec<PendingBooking>,
    ) -> AppResult<Vec<OptimizationOutcome>> {
        let mut ordered = requests;
        ordered.sort_by(|a, b| b.priority.weight().cmp(&a.priority.weight()));

        let mut outcomes = Vec::with_capacity(ordered.len());
        for booking in ordered {
            let result = self.conflicts.check_conflicts(&booking.request)?;

            if !result.has_conflicts {
                outcomes.push(OptimizationOutcome {
                    optimized: OptimizedSlot {
                        date: booking.request.date,
                        time_slot: booking.request.time_slot.clone(),
                        confidence: 1.0,
                    },
                    conflicts: Vec::new(),
                    booking,
                });
                continue;
            }

            let messages: Vec<String> = result
                .conflicts
                .iter()
                .map(|conflict| conflict.message.clone())
                .collect();
            let reassigned = result
                .available_alternatives
                .first()
                .and_then(|day| day.time_slots.first().map(|slot| (day.date, slot.clone())));

            let outcome = match reassigned {
                Some((date, time_slot)) => {
                    debug!(
                        target: "app::optimizer",
                        booking_id = %booking.id,
                        %date,
                        %time_slot,
                        "booking reassigned"
                    );
                    OptimizationOutcome {
                        optimized: OptimizedSlot {
                            date,
                            time_slot,
                            confidence: 0.8,
                        },
                        conflicts: messages,
                        booking,
                    }
                }
                None => {
                    debug!(
                        target: "app::optimizer",
                        booking_id = %booking.id,
                        "no alternative found, keeping requested slot"
                    );
                    OptimizationOutcome {
                        optimized: OptimizedSlot {
                            date: booking.request.date,
                            time_slot: booking.request.time_slot.clone(),
                            confidence: 1.0,
                        },
                        conflicts: messages,
                        booking,
                    }
                }
            };
            outcomes.push(outcome);
        }

        info!(
            target: "app::optimizer",
            count = outcomes.len(),
            "schedule optimization finished"
        );
        Ok(outcomes)
    }
}
