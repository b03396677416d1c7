use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::catalog::{VehicleRecord, VehicleStatus};

const BASE_SELECT: &str = r#"
    SELECT id, model, status, created_at, updated_at
    FROM vehicles
"#;

#[derive(Debug, Clone)]
pub struct VehicleRow {
    pub id: String,
    pub model: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl VehicleRow {
    pub fn from_record(record: &VehicleRecord) -> Self {
        Self {
            id: record.id.clone(),
            model: record.model.clone(),
            status: record.status.as_str().to_string(),
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> AppResult<VehicleRecord> {
        let status = VehicleStatus::from_str(&self.status)
            .ok_or_else(|| AppError::database(format!("未知的车辆状态: {}", self.status)))?;

        Ok(VehicleRecord {
            id: self.id,
            model: self.model,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for VehicleRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(VehicleRow {
            id: row.get("id")?,
            model: row.get("model")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct VehicleRepository;

impl VehicleRepository {
    pub fn insert(conn: &Connection, row: &VehicleRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO vehicles (id, model, status, created_at, updated_at)
                VALUES (:id, :model, :status, :created_at, :updated_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":model": &row.model,
                ":status": &row.status,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update_status(conn: &Connection, id: &str, status: VehicleStatus) -> AppResult<()> {
        let affected = conn.execute(
            r#"
                UPDATE vehicles SET
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

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<VehicleRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| VehicleRow::try_from(row))
            .optional()?;
        Ok(row)
    }
}
