use std::sync::Arc;

use chrono::NaiveDate;
use servicelane::db::repositories::booking_repository::{BookingRepository, BookingRow};
use servicelane::db::repositories::staff_repository::{StaffRepository, StaffShiftRow};
use servicelane::db::repositories::vehicle_repository::{VehicleRepository, VehicleRow};
use servicelane::db::DbPool;
use servicelane::models::booking::{BookingKind, BookingRecord, BookingStatus};
use servicelane::models::catalog::{StaffRole, StaffShiftRecord, VehicleRecord};
use servicelane::models::conflict::{BookingPriority, ConflictCheckRequest, PendingBooking};
use servicelane::models::rules::SchedulingRules;
use servicelane::services::conflict_service::ConflictService;
use servicelane::services::schedule_optimizer::ScheduleOptimizer;
use tempfile::tempdir;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 9).expect("base date")
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

fn seed_confirmed_test_drive(pool: &DbPool, vehicle_id: &str, slot: &str) {
    let record = BookingRecord::new(
        BookingKind::TestDrive,
        Some(vehicle_id.to_string()),
        None,
        monday(),
        slot,
    );
    let id = record.id.clone();
    pool.with_connection(|conn| BookingRepository::insert(conn, &BookingRow::from_record(&record)))
        .expect("insert booking");
    pool.with_connection(|conn| {
        BookingRepository::update_status(conn, &id, BookingStatus::Confirmed)
    })
    .expect("update status");
}

#[test]
fn prioritized_batch_reassigns_only_the_clashing_booking() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("optimizer_flow.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday()]);

    let rules = SchedulingRules {
        break_times: Vec::new(),
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");
    let optimizer = ScheduleOptimizer::new(Arc::new(service));

    let vehicle_id = seed_vehicle(&pool, "AION S 试驾车");
    seed_confirmed_test_drive(&pool, &vehicle_id, "10:00");

    let requests = vec![
        PendingBooking {
            id: "walk-in".into(),
            request: ConflictCheckRequest::service(Vec::new(), monday(), "09:00"),
            priority: BookingPriority::Low,
        },
        PendingBooking {
            id: "vip-test-drive".into(),
            request: ConflictCheckRequest::test_drive(vehicle_id, monday(), "10:30"),
            priority: BookingPriority::High,
        },
        PendingBooking {
            id: "afternoon-service".into(),
            request: ConflictCheckRequest::service(Vec::new(), monday(), "14:00"),
            priority: BookingPriority::Medium,
        },
    ];

    let outcomes = optimizer.optimize_schedule(requests).expect("optimize");

    let ids: Vec<&str> = outcomes.iter().map(|o| o.booking.id.as_str()).collect();
    assert_eq!(ids, vec!["vip-test-drive", "afternoon-service", "walk-in"]);

    // 高优先级请求撞上 [09:45, 11:15) 的缓冲区间,被改派到当日最早空闲时段
    let vip = &outcomes[0];
    assert_eq!(vip.optimized.confidence, 0.8);
    assert_eq!(vip.optimized.date, monday());
    assert_eq!(vip.optimized.time_slot, "08:00");
    assert!(vip.conflicts.iter().any(|m| m.contains("车辆")));

    for outcome in &outcomes[1..] {
        assert_eq!(outcome.optimized.confidence, 1.0);
        assert_eq!(outcome.optimized.time_slot, outcome.booking.request.time_slot);
        assert!(outcome.conflicts.is_empty());
    }
}

#[test]
fn saturated_day_keeps_the_requested_slot() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("saturated.sqlite")).expect("db pool");
    // 只给周一排班:当日满了之后,后续日期因无人在岗而不可用
    seed_roster(&pool, &[monday()]);

    let rules = SchedulingRules {
        max_bookings_per_day: 1,
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");
    let optimizer = ScheduleOptimizer::new(Arc::new(service));

    let record = BookingRecord::new(BookingKind::Service, None, None, monday(), "09:00");
    pool.with_connection(|conn| BookingRepository::insert(conn, &BookingRow::from_record(&record)))
        .expect("insert booking");

    let outcomes = optimizer
        .optimize_schedule(vec![PendingBooking {
            id: "overflow".into(),
            request: ConflictCheckRequest::service(Vec::new(), monday(), "14:00"),
            priority: BookingPriority::Medium,
        }])
        .expect("optimize");

    let outcome = &outcomes[0];
    assert_eq!(outcome.optimized.date, monday());
    assert_eq!(outcome.optimized.time_slot, "14:00");
    assert_eq!(outcome.optimized.confidence, 1.0);
    assert!(outcome.conflicts.iter().any(|m| m.contains("上限")));
}

#[test]
fn single_pass_probes_do_not_reserve_slots_for_each_other() {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("single_pass.sqlite")).expect("db pool");
    seed_roster(&pool, &[monday()]);

    let rules = SchedulingRules {
        break_times: Vec::new(),
        ..Default::default()
    };
    let service = ConflictService::new(pool.clone(), rules).expect("conflict service");
    let optimizer = ScheduleOptimizer::new(Arc::new(service));

    let vehicle_id = seed_vehicle(&pool, "AION V 试驾车");
    seed_confirmed_test_drive(&pool, &vehicle_id, "10:00");

    let clashing = |id: &str| PendingBooking {
        id: id.into(),
        request: ConflictCheckRequest::test_drive(vehicle_id.clone(), monday(), "10:00"),
        priority: BookingPriority::High,
    };

    let outcomes = optimizer
        .optimize_schedule(vec![clashing("first"), clashing("second")])
        .expect("optimize");

    // 指派不回写存储,两条请求看到同一份占用,拿到同一个候选时段
    assert_eq!(outcomes[0].optimized.time_slot, "08:00");
    assert_eq!(outcomes[1].optimized.time_slot, "08:00");
    assert!(outcomes.iter().all(|o| o.optimized.confidence == 0.8));
}
