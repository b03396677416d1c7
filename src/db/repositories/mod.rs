pub mod booking_repository;
pub mod service_type_repository;
pub mod staff_repository;
pub mod vehicle_repository;
