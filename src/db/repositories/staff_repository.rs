use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, Row};

use crate::error::{AppError, AppResult};
use crate::models::catalog::{StaffRole, StaffShiftRecord};

const BASE_SELECT: &str = r#"
    SELECT id, staff_name, role, date, start_time, end_time, created_at
    FROM staff_shifts
"#;

#[derive(Debug, Clone)]
pub struct StaffShiftRow {
    pub id: String,
    pub staff_name: String,
    pub role: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub created_at: String,
}

impl StaffShiftRow {
    pub fn from_record(record: &StaffShiftRecord) -> Self {
        Self {
            id: record.id.clone(),
            staff_name: record.staff_name.clone(),
            role: record.role.as_str().to_string(),
            date: record.date.to_string(),
            start_time: record.start_time.clone(),
            end_time: record.end_time.clone(),
            created_at: record.created_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<StaffShiftRecord> {
        let role = StaffRole::from_str(&self.role)
            .ok_or_else(|| AppError::database(format!("未知的员工角色: {}", self.role)))?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| AppError::database(format!("班次日期非法: {}", self.date)))?;

        Ok(StaffShiftRecord {
            id: self.id,
            staff_name: self.staff_name,
            role,
            date,
            start_time: self.start_time,
            end_time: self.end_time,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<&Row<'_>> for StaffShiftRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(StaffShiftRow {
            id: row.get("id")?,
            staff_name: row.get("staff_name")?,
            role: row.get("role")?,
            date: row.get("date")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            created_at: row.get("created_at")?,
        })
    }
}

pub struct StaffRepository;

impl StaffRepository {
    pub fn insert(conn: &Connection, row: &StaffShiftRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO staff_shifts (
                    id, staff_name, role, date, start_time, end_time, created_at
                ) VALUES (
                    :id, :staff_name, :role, :date, :start_time, :end_time, :created_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":staff_name": &row.staff_name,
                ":role": &row.role,
                ":date": &row.date,
                ":start_time": &row.start_time,
                ":end_time": &row.end_time,
                ":created_at": &row.created_at,
            },
        )?;

        Ok(())
    }

    pub fn list_for_date(conn: &Connection, date: NaiveDate) -> AppResult<Vec<StaffShiftRow>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE date = ?1 ORDER BY start_time ASC",
            BASE_SELECT
        ))?;

        let rows = stmt
            .query_map([date.to_string()], |row| StaffShiftRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
