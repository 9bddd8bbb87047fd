//! User and device queries for the `SolarLink` cloud.

use solarlink_core::db::{DatabaseError, unix_timestamp};

use super::db::CloudDatabase;
use super::models::{Device, DeviceWithAccess, User};

impl CloudDatabase {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create or refresh a user row after the external identity layer has
    /// verified a login.
    ///
    /// First verification inserts the row; later logins update the profile
    /// fields and `last_login`. Both paths run in one transaction.
    pub async fn upsert_user_on_login(
        &self,
        external_id: &str,
        email: &str,
        name: Option<&str>,
        picture: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await?;

        let user = if let Some(user) = existing {
            sqlx::query(
                "UPDATE users SET email = ?, name = ?, picture = ?, last_login = ? WHERE id = ?",
            )
            .bind(email)
            .bind(name)
            .bind(picture)
            .bind(now)
            .bind(&user.id)
            .execute(&mut *tx)
            .await?;

            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
                .bind(&user.id)
                .fetch_one(&mut *tx)
                .await?
        } else {
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO users (id, external_id, email, name, picture, created_at, last_login) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(external_id)
            .bind(email)
            .bind(name)
            .bind(picture)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
                .bind(&id)
                .fetch_one(&mut *tx)
                .await?
        };

        tx.commit().await?;

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Find a user by email, if one has ever logged in.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;

        Ok(user)
    }

    // =========================================================================
    // Device queries
    // =========================================================================

    /// Whether a device row exists for this identifier (i.e. the device has
    /// been claimed by at least one user).
    pub async fn device_exists(&self, device_identifier: &str) -> Result<bool, DatabaseError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT id FROM devices WHERE device_identifier = ?")
                .bind(device_identifier)
                .fetch_optional(self.pool())
                .await?;

        Ok(row.is_some())
    }

    /// Get a device by its identifier.
    pub async fn get_device(&self, device_identifier: &str) -> Result<Device, DatabaseError> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE device_identifier = ?")
            .bind(device_identifier)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Device {device_identifier}")))
    }

    /// List devices accessible to a user, most recently added first.
    pub async fn list_devices_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<DeviceWithAccess>, DatabaseError> {
        let devices = sqlx::query_as::<_, DeviceWithAccess>(
            "SELECT d.id, d.device_identifier, d.name, d.created_at, ud.is_owner, ud.added_at
             FROM devices d
             JOIN user_devices ud ON d.id = ud.device_id
             WHERE ud.user_id = ?
             ORDER BY ud.added_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(devices)
    }

    /// Read-only access check: does any relation link this user to this
    /// device identifier? Owner and shared viewers both pass.
    pub async fn has_access(
        &self,
        user_id: &str,
        device_identifier: &str,
    ) -> Result<bool, DatabaseError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM user_devices ud
             JOIN devices d ON d.id = ud.device_id
             WHERE ud.user_id = ? AND d.device_identifier = ?",
        )
        .bind(user_id)
        .bind(device_identifier)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.is_some())
    }
}
