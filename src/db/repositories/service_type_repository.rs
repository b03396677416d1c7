use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;
use crate::models::catalog::ServiceTypeRecord;

const BASE_SELECT: &str = r#"
    SELECT id, name, duration_minutes, created_at, updated_at
    FROM service_types
"#;

#[derive(Debug, Clone)]
pub struct ServiceTypeRow {
    pub id: String,
    pub name: String,
    pub duration_minutes: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ServiceTypeRow {
    pub fn from_record(record: &ServiceTypeRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            duration_minutes: record.duration_minutes,
            created_at: record.created_at.clone(),
            updated_at: record.updated_at.clone(),
        }
    }

    pub fn into_record(self) -> ServiceTypeRecord {
        ServiceTypeRecord {
            id: self.id,
            name: self.name,
            duration_minutes: self.duration_minutes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl TryFrom<&Row<'_>> for ServiceTypeRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(ServiceTypeRow {
            id: row.get("id")?,
            name: row.get("name")?,
            duration_minutes: row.get("duration_minutes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct ServiceTypeRepository;

impl ServiceTypeRepository {
    pub fn insert(conn: &Connection, row: &ServiceTypeRow) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO service_types (id, name, duration_minutes, created_at, updated_at)
                VALUES (:id, :name, :duration_minutes, :created_at, :updated_at)
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":duration_minutes": row.duration_minutes,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ServiceTypeRow>> {
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", BASE_SELECT))?;
        let row = stmt
            .query_row([id], |row| ServiceTypeRow::try_from(row))
            .optional()?;
        Ok(row)
    }
}
