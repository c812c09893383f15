//! Driver registry database operations

use dispatch_common::profile::Driver;
use dispatch_common::{Error, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Driver fields supplied by clients; `id` is always server-assigned
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInput {
    pub name: Option<String>,
    pub license: Option<String>,
    pub phone: Option<String>,
    pub vehicle_no: Option<String>,
    pub vehicle_type: Option<String>,
}

type DriverRow = (String, String, String, String, String, String);

fn driver_from_row(row: DriverRow) -> Driver {
    let (id, name, license, phone, vehicle_no, vehicle_type) = row;
    Driver {
        id,
        name,
        license,
        phone,
        vehicle_no,
        vehicle_type,
    }
}

fn required_name(name: Option<&str>) -> Result<String> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(Error::InvalidInput("Driver name is required".to_string())),
    }
}

/// Drivers in registration order
pub async fn list_drivers(db: &SqlitePool) -> Result<Vec<Driver>> {
    let rows: Vec<DriverRow> = sqlx::query_as(
        "SELECT guid, name, license, phone, vehicle_no, vehicle_type FROM drivers ORDER BY created_at, rowid"
    )
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(driver_from_row).collect())
}

pub async fn get_driver(db: &SqlitePool, id: &str) -> Result<Driver> {
    let row: Option<DriverRow> = sqlx::query_as(
        "SELECT guid, name, license, phone, vehicle_no, vehicle_type FROM drivers WHERE guid = ?"
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    row.map(driver_from_row)
        .ok_or_else(|| Error::NotFound(format!("Driver {}", id)))
}

pub async fn add_driver(db: &SqlitePool, input: &DriverInput) -> Result<Driver> {
    let driver = Driver {
        id: Uuid::new_v4().to_string(),
        name: required_name(input.name.as_deref())?,
        license: input.license.clone().unwrap_or_default(),
        phone: input.phone.clone().unwrap_or_default(),
        vehicle_no: input.vehicle_no.clone().unwrap_or_default(),
        vehicle_type: input.vehicle_type.clone().unwrap_or_default(),
    };

    sqlx::query(
        "INSERT INTO drivers (guid, name, license, phone, vehicle_no, vehicle_type) VALUES (?, ?, ?, ?, ?, ?)"
    )
    .bind(&driver.id)
    .bind(&driver.name)
    .bind(&driver.license)
    .bind(&driver.phone)
    .bind(&driver.vehicle_no)
    .bind(&driver.vehicle_type)
    .execute(db)
    .await?;

    Ok(driver)
}

/// Merge the supplied fields into an existing driver
pub async fn update_driver(db: &SqlitePool, id: &str, input: &DriverInput) -> Result<Driver> {
    let mut driver = get_driver(db, id).await?;

    if input.name.is_some() {
        driver.name = required_name(input.name.as_deref())?;
    }
    if let Some(license) = &input.license {
        driver.license = license.clone();
    }
    if let Some(phone) = &input.phone {
        driver.phone = phone.clone();
    }
    if let Some(vehicle_no) = &input.vehicle_no {
        driver.vehicle_no = vehicle_no.clone();
    }
    if let Some(vehicle_type) = &input.vehicle_type {
        driver.vehicle_type = vehicle_type.clone();
    }

    sqlx::query(
        "UPDATE drivers SET name = ?, license = ?, phone = ?, vehicle_no = ?, vehicle_type = ? WHERE guid = ?"
    )
    .bind(&driver.name)
    .bind(&driver.license)
    .bind(&driver.phone)
    .bind(&driver.vehicle_no)
    .bind(&driver.vehicle_type)
    .bind(id)
    .execute(db)
    .await?;

    Ok(driver)
}

pub async fn delete_driver(db: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM drivers WHERE guid = ?")
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Driver {}", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        dispatch_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    fn madhan() -> DriverInput {
        DriverInput {
            name: Some(" MADHAN ".to_string()),
            license: Some("TN4222035355426".to_string()),
            phone: Some("9876543210".to_string()),
            vehicle_no: Some("TN36 AY0948".to_string()),
            vehicle_type: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let pool = setup_test_db().await;

        let driver = add_driver(&pool, &madhan()).await.unwrap();
        assert_eq!(driver.name, "MADHAN");
        assert_eq!(driver.vehicle_type, "");

        let drivers = list_drivers(&pool).await.unwrap();
        assert_eq!(drivers, vec![driver]);
    }

    #[tokio::test]
    async fn test_add_requires_name() {
        let pool = setup_test_db().await;
        let result = add_driver(&pool, &DriverInput::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let pool = setup_test_db().await;
        let driver = add_driver(&pool, &madhan()).await.unwrap();

        let patch = DriverInput {
            phone: Some("9000000000".to_string()),
            vehicle_type: Some("Lorry".to_string()),
            ..Default::default()
        };
        let updated = update_driver(&pool, &driver.id, &patch).await.unwrap();

        assert_eq!(updated.name, "MADHAN");
        assert_eq!(updated.phone, "9000000000");
        assert_eq!(updated.vehicle_type, "Lorry");
        assert_eq!(get_driver(&pool, &driver.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let pool = setup_test_db().await;
        let result = delete_driver(&pool, "nope").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
