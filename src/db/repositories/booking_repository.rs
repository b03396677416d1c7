use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::booking::{BookingKind, BookingRecord, BookingStatus};

const BASE_SELECT: &str = r#"
    SELECT
        id,
        kind,
        vehicle_id,
        service_type_id,
        date,
        time_slot,
        status,
        customer_name,
        created_at,
        updated_at
    FROM bookings
"#;

const ACTIVE_SELECT: &str = r#"
    SELECT b.id, b.time_slot, st.duration_minutes
    FROM bookings b
    LEFT JOIN service_types st ON st.id = b.service_type_id
"#;

#[derive(Debug, Clone)]
pub struct BookingRow {
    pub id: String,
    pub kind: String,
    pub vehicle_id: Option<String>,
    pub service_type_id: Option<String>,
    pub date: String,
    pub time_slot: String,
    pub status: String,
    pub customer_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl BookingRow {
    pub fn from_record(record: &BookingRecord) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.kind.as_str().to_string(),
            vehicle_id: record.vehicle_id.clone(),
            service_type_id: record.service_type_id.clone(),
            date: record.date.to_string(),
            time_slot: record.time_slot.clone(),
            status: record.status.as_str().to_string(),
            customer_name: record.customer_name.clone(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<BookingRecord> {
        let kind = BookingKind::from_str(&self.kind)
            .ok_or_else(|| AppError::database(format!("未知的预约类别: {}", self.kind)))?;
        let status = BookingStatus::from_str(&self.status)
            .ok_or_else(|| AppError::database(format!("未知的预约状态: {}", self.status)))?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| AppError::database(format!("预约日期非法: {}", self.date)))?;

        Ok(BookingRecord {
            id: self.id,
            kind,
            vehicle_id: self.vehicle_id,
            service_type_id: self.service_type_id,
            date,
            time_slot: self.time_slot,
            status,
            customer_name: self.customer_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for BookingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(BookingRow {
            id: row.get("id")?,
            kind: row.get("kind")?,
            vehicle_id: row.get("vehicle_id")?,
            service_type_id: row.get("service_type_id")?,
            date: row.get("date")?,
            time_slot: row.get("time_slot")?,
            status: row.get("status")?,
            customer_name: row.get("customer_name")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// 冲突检查使用的活跃预约视图:起始时段加上所属服务项目的时长。
#[derive(Debug, Clone)]
pub struct ActiveBooking {
    pub id: String,
    pub time_slot: String,
    pub duration_minutes: Option<i64>,
}

impl TryFrom<&Row<'_>> for ActiveBooking {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(ActiveBooking {
            id: row.get("id")?,
            time_slot: row.get("time_slot")?,
            duration_minutes: row.get("duration_minutes")?,
        })
    }
}

pub struct BookingRepository;

impl BookingRepository {
    pub fn insert(conn: &Connection, row: &BookingRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO bookings (
                    id,
                    kind,
                    vehicle_id,
                    service_type_id,
                    date,
                    time_slot,
                    status,
                    customer_name,
                    created_at,
                    updated_at
                ) VALUES (
                    :id,
                    :kind,
                    :vehicle_id,
                    :service_type_id,
                    :date,
                    :time_slot,
                    :status,
                    :customer_name,
                    :created_at,
                    :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":kind": &row.kind,
                ":vehicle_id": &row.vehicle_id,
                ":service_type_id": &row.service_type_id,
                ":date": &row.date,
                ":time_slot": &row.time_slot,
                ":status": &row.status,
                ":customer_name": &row.customer_name,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update_status(conn: &Connection, id: &str, status: BookingStatus) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE bookings SET
                    status = :status,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = :id
            "#,
            named_params! {
                ":id": id,
                ":status": status.as_str(),
            },
        )?;

        if affected == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<BookingRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| BookingRow::try_from(row))
            .optional()?;
        Ok(row)
    }

    pub fn list_active_for_vehicle(
        conn: &Connection,
        vehicle_id: &str,
        date: NaiveDate,
        exclude_booking_id: Option<&str>,
    ) -> AppResult<Vec<ActiveBooking>> {
        let mut stmt = conn.prepare(&format!(
            r#"{}
            WHERE b.vehicle_id = :vehicle_id
              AND b.date = :date
              AND b.status IN ('PENDING', 'CONFIRMED')
              AND (:exclude_id IS NULL OR b.id != :exclude_id)
            ORDER BY b.time_slot ASC
            "#,
            ACTIVE_SELECT
        ))?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":vehicle_id": vehicle_id,
                    ":date": date.to_string(),
                    ":exclude_id": &exclude_booking_id,
                },
                |row| ActiveBooking::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn list_active_for_service_type(
        conn: &Connection,
        service_type_id: &str,
        date: NaiveDate,
        exclude_booking_id: Option<&str>,
    ) -> AppResult<Vec<ActiveBooking>> {
        let mut stmt = conn.prepare(&format!(
            r#"{}
            WHERE b.service_type_id = :service_type_id
              AND b.date = :date
              AND b.status IN ('PENDING', 'CONFIRMED')
              AND (:exclude_id IS NULL OR b.id != :exclude_id)
            ORDER BY b.time_slot ASC
            "#,
            ACTIVE_SELECT
        ))?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":service_type_id": service_type_id,
                    ":date": date.to_string(),
                    ":exclude_id": &exclude_booking_id,
                },
                |row| ActiveBooking::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn list_active_for_date(
        conn: &Connection,
        date: NaiveDate,
        exclude_booking_id: Option<&str>,
    ) -> AppResult<Vec<ActiveBooking>> {
        let mut stmt = conn.prepare(&format!(
            r#"{}
            WHERE b.date = :date
              AND b.status IN ('PENDING', 'CONFIRMED')
              AND (:exclude_id IS NULL OR b.id != :exclude_id)
            ORDER BY b.time_slot ASC
            "#,
            ACTIVE_SELECT
        ))?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":date": date.to_string(),
                    ":exclude_id": &exclude_booking_id,
                },
                |row| ActiveBooking::try_from(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn count_active_for_date(
        conn: &Connection,
        date: NaiveDate,
        exclude_booking_id: Option<&str>,
    ) -> AppResult<u32> {
        let count: u32 = conn.query_row(
            r#"
                SELECT COUNT(*)
                FROM bookings
                WHERE date = :date
                  AND status IN ('PENDING', 'CONFIRMED')
                  AND (:exclude_id IS NULL OR id != :exclude_id)
            "#,
            named_params! {
                ":date": date.to_string(),
                ":exclude_id": &exclude_booking_id,
            },
            |row| row.get(0),
        )?;

        Ok(count)
    }
}
