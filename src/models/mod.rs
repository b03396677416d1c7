pub mod booking;
pub mod catalog;
pub mod conflict;
pub mod rules;
pub mod slot;
