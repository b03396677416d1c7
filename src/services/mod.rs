pub mod alternative_finder;
pub mod availability;
pub mod conflict_service;
pub mod schedule_optimizer;
pub mod slot_calendar;
pub mod staff_oracle;
