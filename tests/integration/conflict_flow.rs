use chrono::NaiveDate;
use servicelane::db::repositories::booking_repository::{BookingRepository, BookingRow};
use servicelane::db::repositories::service_type_repository::{
    ServiceTypeRepository, ServiceTypeRow,
};
use servicelane::db::repositories::staff_repository::{StaffRepository, StaffShiftRow};
use servicelane::db::repositories::vehicle_repository::{VehicleRepository, VehicleRow};
use servicelane::db::DbPool;
use servicelane::error::AppError;
use servicelane::models::booking::{BookingKind, BookingRecord, BookingStatus};
use servicelane::models::catalog::{ServiceTypeRecord, StaffRole, StaffShiftRecord, VehicleRecord};
use servicelane::models::conflict::{ConflictCheckRequest, ConflictSeverity, ConflictType};
use servicelane::models::rules::{BlockedDate, BreakWindow, SchedulingRules};
use servicelane::services::conflict_service::ConflictService;
use tempfile::tempdir;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 9).expect("base date")
}

fn weekday(offset: u64) -> NaiveDate {
    monday() + chrono::Duration::days(offset as i64)
}

fn seed_roster(pool: &DbPool, dates: &[NaiveDate]) {
    for date in dates {
        for (name, role) in [
            ("王技师", StaffRole::Technician),
            ("赵顾问", StaffRole::Sales),
        ] {
            let shift = StaffShiftRecord::new(name, role, *date, "08:00", "18:00");
            pool.with_connection(|conn| {
                StaffRepository::insert(conn, &StaffShiftRow::from_record(&shift))
            })
            .expect("insert shift");
        }
    }
}

fn seed_vehicle(pool: &DbPool, model: &str) -> String {
    let record = VehicleRecord::new(model);
    let id = record.id.clone();
    pool.with_connection(|conn| VehicleRepository::insert(conn, &VehicleRow::from_record(&record)))
        .expect("insert vehicle");
    id
}

fn seed_service_type(pool: &DbPool, name: &str, duration: i64) -> String {
    let record = ServiceTypeRecord::new(name, duration);
    let id = record.id.clone();
    pool.with_connection(|conn| {
        ServiceTypeRepository::insert(conn, &ServiceTypeRow::from_record(&record))
    })
    .expect("insert service type");
    id
}

fn seed_booking(
    pool: &DbPool,
    kind: BookingKind,
    vehicle_id: Option<String>,
    service_type_id: Option<String>,
    date: NaiveDate,
    slot: &str,
    status: BookingStatus,
) -> String {
    let record = BookingRecord::new(kind, vehicle_id, service_type_id, date, slot);
    let id = record.id.clone();
    pool.with_connection(|conn| BookingRepository::insert(conn, &BookingRow::from_record(&record)))
        .expect("insert booking");
    if status != BookingStatus::Pending {
        pool.with_connection(|conn| BookingRepository::update_status(conn, &id, status))
            .expect("update status");
    }
    id
}

#[test]
fn test_drive_buffer_clash_resolves_on_the_same_day() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("conflict_flow.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday(), weekday(1), weekday(2), weekday(3)]);

    // 上午 10 点已有确认的试驾,缓冲 15 分钟
    let rules = SchedulingRules {
        break_times: Vec::new(),
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");
    let vehicle_id = seed_vehicle(&pool, "AION S 试驾车");
    let existing = seed_booking(
        &pool,
        BookingKind::TestDrive,
        Some(vehicle_id.clone()),
        None,
        monday(),
        "10:00",
        BookingStatus::Confirmed,
    );

    // 10:30 落在 [09:45, 11:15) 内,应报车辆冲突
    let request = ConflictCheckRequest::test_drive(vehicle_id.clone(), monday(), "10:30");
    let result = service.check_conflicts(&request).expect("check 10:30");

    assert!(result.has_conflicts);
    let conflict = &result.conflicts[0];
    assert_eq!(conflict.conflict_type, ConflictType::VehicleUnavailable);
    assert_eq!(conflict.severity, ConflictSeverity::High);
    assert_eq!(conflict.booking_id.as_deref(), Some(existing.as_str()));
    assert!(!conflict.suggested_alternatives.is_empty());

    let same_day = result
        .available_alternatives
        .iter()
        .find(|day| day.date == monday())
        .expect("same-day alternatives");
    assert!(!same_day.time_slots.contains(&"10:00".to_string()));
    assert!(!same_day.time_slots.contains(&"11:00".to_string()));
    assert!(same_day.time_slots.contains(&"08:00".to_string()));

    // 12:00 已经离开缓冲区间,应当放行
    let request = ConflictCheckRequest::test_drive(vehicle_id, monday(), "12:00");
    let result = service.check_conflicts(&request).expect("check 12:00");
    assert!(!result.has_conflicts);
    assert!(result.available_alternatives.is_empty());
}

#[test]
fn service_capacity_flags_only_the_clashing_type() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("capacity.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday()]);

    let rules = SchedulingRules {
        max_concurrent_bookings: 1,
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");
    let quick_id = seed_service_type(&pool, "快速保养", 30);
    let wheel_id = seed_service_type(&pool, "四轮定位", 45);
    seed_booking(
        &pool,
        BookingKind::Service,
        None,
        Some(quick_id.clone()),
        monday(),
        "09:00",
        BookingStatus::Pending,
    );

    // 两个项目合计 75 分钟,占用 [09:00, 10:15)
    let request = ConflictCheckRequest::service(
        vec![quick_id.clone(), wheel_id.clone()],
        monday(),
        "09:00",
    );
    let result = service.check_conflicts(&request).expect("check");

    assert!(result.has_conflicts);
    let overlaps: Vec<_> = result
        .conflicts
        .iter()
        .filter(|c| c.conflict_type == ConflictType::ServiceOverlap)
        .collect();
    assert_eq!(overlaps.len(), 1);
    assert!(overlaps[0].message.contains("快速保养"));
    assert!(!overlaps[0].message.contains("四轮定位"));
    assert_eq!(overlaps[0].severity, ConflictSeverity::Medium);
}

#[test]
fn break_window_redirects_to_surrounding_slots() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("break.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday()]);

    // 午休 13:00-14:00,13:30 的请求应被拦下
    let rules = SchedulingRules {
        break_times: vec![BreakWindow {
            start: "13:00".into(),
            end: "14:00".into(),
        }],
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");

    let request = ConflictCheckRequest::service(Vec::new(), monday(), "13:30");
    let result = service.check_conflicts(&request).expect("check");

    assert!(result.has_conflicts);
    assert_eq!(result.conflicts[0].conflict_type, ConflictType::TimeSlotFull);
    assert_eq!(result.conflicts[0].severity, ConflictSeverity::Medium);
    assert!(result.conflicts[0].message.contains("休息时段"));

    let same_day = &result.available_alternatives[0];
    assert_eq!(same_day.date, monday());
    assert!(same_day.time_slots.contains(&"12:00".to_string()));
    assert!(same_day.time_slots.contains(&"14:00".to_string()));
    assert!(!same_day.time_slots.contains(&"13:00".to_string()));
}

#[test]
fn daily_cap_pushes_bookings_to_later_days() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("daily_cap.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday(), weekday(1), weekday(2), weekday(3)]);

    let rules = SchedulingRules {
        max_bookings_per_day: 2,
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");
    seed_booking(
        &pool,
        BookingKind::Service,
        None,
        None,
        monday(),
        "09:00",
        BookingStatus::Pending,
    );
    seed_booking(
        &pool,
        BookingKind::Service,
        None,
        None,
        monday(),
        "15:00",
        BookingStatus::Confirmed,
    );

    let request = ConflictCheckRequest::service(Vec::new(), monday(), "16:00");
    let result = service.check_conflicts(&request).expect("check");

    assert!(result.has_conflicts);
    let full = result
        .conflicts
        .iter()
        .find(|c| c.conflict_type == ConflictType::TimeSlotFull)
        .expect("cap conflict");
    assert_eq!(full.severity, ConflictSeverity::High);
    assert!(full.message.contains("上限"));
    assert!(full
        .suggested_alternatives
        .iter()
        .all(|s| s.date > monday() && s.time_slot == "16:00"));

    // 当日已满,可改约的只剩后续工作日
    assert!(!result.available_alternatives.is_empty());
    assert!(result
        .available_alternatives
        .iter()
        .all(|day| day.date > monday()));
}

#[test]
fn editing_keeps_own_slot_and_unknown_ids_error() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("editing.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday()]);

    let service =
        ConflictService::new(pool.clone(), SchedulingRules::default()).expect("conflict service");
    let vehicle_id = seed_vehicle(&pool, "AION Y 试驾车");
    let existing = seed_booking(
        &pool,
        BookingKind::TestDrive,
        Some(vehicle_id.clone()),
        None,
        monday(),
        "10:00",
        BookingStatus::Confirmed,
    );

    let mut request = ConflictCheckRequest::test_drive(vehicle_id, monday(), "10:00");
    request.exclude_booking_id = Some(existing);
    let result = service.check_conflicts(&request).expect("check");
    assert!(!result.has_conflicts);

    let request = ConflictCheckRequest::test_drive("ghost-vehicle", monday(), "10:00");
    assert!(matches!(
        service.check_conflicts(&request),
        Err(AppError::MissingEntity { entity: "车辆", .. })
    ));

    let request =
        ConflictCheckRequest::service(vec!["ghost-service".to_string()], monday(), "10:00");
    assert!(matches!(
        service.check_conflicts(&request),
        Err(AppError::MissingEntity { entity: "服务项目", .. })
    ));
}

#[test]
fn roster_coverage_limits_bookable_slots() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("roster.sqlite")).expect("db pool");

    let service =
        ConflictService::new(pool.clone(), SchedulingRules::default()).expect("conflict service");

    // 无人排班:整天都约不进来,也给不出候选
    let request = ConflictCheckRequest::service(Vec::new(), monday(), "10:00");
    let result = service.check_conflicts(&request).expect("check");
    assert!(result.has_conflicts);
    assert_eq!(
        result.conflicts[0].conflict_type,
        ConflictType::StaffUnavailable
    );
    assert!(result.available_alternatives.is_empty());

    // 下午排一个班次,候选收敛到班次覆盖的时段
    let shift = StaffShiftRecord::new("王技师", StaffRole::Technician, monday(), "14:00", "16:00");
    pool.with_connection(|conn| StaffRepository::insert(conn, &StaffShiftRow::from_record(&shift)))
        .expect("insert shift");

    let result = service.check_conflicts(&request).expect("check");
    assert!(result.has_conflicts);
    let same_day = result
        .available_alternatives
        .iter()
        .find(|day| day.date == monday())
        .expect("same-day alternatives");
    assert_eq!(same_day.time_slots, vec!["14:00", "15:00"]);
}

#[test]
fn available_slots_respect_occupancy_and_blocked_dates() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("slots.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday()]);

    let blocked = weekday(1);
    let rules = SchedulingRules {
        max_concurrent_bookings: 1,
        blocked_dates: vec![BlockedDate {
            date: blocked,
            reason: "门店盘点".into(),
        }],
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");
    let maintenance_id = seed_service_type(&pool, "常规保养", 60);
    seed_booking(
        &pool,
        BookingKind::Service,
        None,
        Some(maintenance_id.clone()),
        monday(),
        "10:00",
        BookingStatus::Pending,
    );

    let slots = service
        .get_available_time_slots(monday(), &[maintenance_id.clone()], None)
        .expect("probe monday");
    assert!(slots.reason.is_none());
    // 10:00 的既有预约连同缓冲挡掉了相邻起点
    for taken in ["09:00", "10:00", "11:00", "12:00"] {
        assert!(!slots.time_slots.contains(&taken.to_string()));
    }
    assert!(slots.time_slots.contains(&"08:00".to_string()));
    assert!(slots.time_slots.contains(&"13:00".to_string()));

    let blocked_slots = service
        .get_available_time_slots(blocked, &[maintenance_id], None)
        .expect("probe blocked");
    assert!(blocked_slots.time_slots.is_empty());
    assert_eq!(
        blocked_slots.reason.as_deref(),
        Some("该日期不可预约: 门店盘点")
    );
}
