//! Transactional operations over the durable registry.

use serde::Serialize;
use solarlink_core::db::unix_timestamp;
use tracing::{info, instrument};

use super::error::AccessError;
use crate::state::{PairingLedger, StatusCache, StatusSnapshot};
use crate::storage::{CloudDatabase, DeviceWithAccess};

/// Live status attached to a device record.
///
/// Devices the cache has never seen serialize as `{"online":false}`,
/// matching what a restarted process reports until telemetry resumes.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StatusView {
    Known(StatusSnapshot),
    Unknown { online: bool },
}

impl StatusView {
    fn from_snapshot(snapshot: Option<StatusSnapshot>) -> Self {
        snapshot.map_or(Self::Unknown { online: false }, Self::Known)
    }

    pub const fn online(&self) -> bool {
        match self {
            Self::Known(snapshot) => snapshot.online,
            Self::Unknown { online } => *online,
        }
    }
}

/// A device as seen by one user: registry row, access relation, live status.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceRecord {
    pub device_identifier: String,
    pub name: Option<String>,
    pub created_at: i64,
    pub is_owner: bool,
    pub added_at: i64,
    pub status: StatusView,
}

/// Evaluates every claim/share/control/delete request against the registry.
#[derive(Clone)]
pub struct AccessController {
    db: CloudDatabase,
    statuses: StatusCache,
    codes: PairingLedger,
}

impl AccessController {
    pub const fn new(db: CloudDatabase, statuses: StatusCache, codes: PairingLedger) -> Self {
        Self {
            db,
            statuses,
            codes,
        }
    }

    /// Claim a device with a confirmation code, linking it to the user.
    ///
    /// The claimant becomes owner iff the device row is created in this
    /// transaction; claiming an already-registered device yields a shared
    /// (non-owner) relation. The ledger entry is consumed only after the
    /// commit, so a failed claim may be retried with the same code.
    #[instrument(skip(self, code), fields(op = "ClaimDevice"))]
    pub async fn claim_device(
        &self,
        user_id: &str,
        device_identifier: &str,
        code: &str,
        name: Option<&str>,
    ) -> Result<DeviceRecord, AccessError> {
        if !self.codes.matches(device_identifier, code).await {
            return Err(AccessError::InvalidConfirmation);
        }

        let now = unix_timestamp();
        let mut tx = self.db.pool().begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM devices WHERE device_identifier = ?")
                .bind(device_identifier)
                .fetch_optional(&mut *tx)
                .await?;

        let (device_db_id, newly_created) = match existing {
            Some((id,)) => (id, false),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                let device_name = name.map_or_else(
                    || default_device_name(device_identifier),
                    |n| n.to_string(),
                );
                sqlx::query(
                    "INSERT INTO devices (id, device_identifier, name, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(device_identifier)
                .bind(&device_name)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                (id, true)
            }
        };

        let linked: Option<(String,)> =
            sqlx::query_as("SELECT id FROM user_devices WHERE user_id = ? AND device_id = ?")
                .bind(user_id)
                .bind(&device_db_id)
                .fetch_optional(&mut *tx)
                .await?;

        if linked.is_some() {
            return Err(AccessError::AlreadyLinked);
        }

        sqlx::query(
            "INSERT INTO user_devices (id, user_id, device_id, is_owner, added_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&device_db_id)
        .bind(i64::from(newly_created))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, DeviceWithAccess>(
            "SELECT d.id, d.device_identifier, d.name, d.created_at, ud.is_owner, ud.added_at
             FROM devices d
             JOIN user_devices ud ON d.id = ud.device_id
             WHERE d.id = ? AND ud.user_id = ?",
        )
        .bind(&device_db_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        // Compare-and-remove: a newer code published while this claim was
        // in flight must stay valid for the next claimer.
        self.codes.consume_if_matches(device_identifier, code).await;

        info!(
            device_id = %device_identifier,
            user_id = %user_id,
            is_owner = newly_created,
            "Device claimed"
        );

        Ok(self.enrich(row).await)
    }

    /// List the user's devices, most recently added first, each joined with
    /// its live status snapshot.
    #[instrument(skip(self), fields(op = "ListDevicesForUser"))]
    pub async fn list_devices(&self, user_id: &str) -> Result<Vec<DeviceRecord>, AccessError> {
        let rows = self.db.list_devices_for_user(user_id).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(self.enrich(row).await);
        }

        Ok(records)
    }

    /// Remove the user's access to a device. When the last relation goes,
    /// the device row goes with it in the same transaction.
    #[instrument(skip(self), fields(op = "RevokeAccess"))]
    pub async fn revoke_access(
        &self,
        user_id: &str,
        device_identifier: &str,
    ) -> Result<(), AccessError> {
        let mut tx = self.db.pool().begin().await?;

        let device: Option<(String,)> =
            sqlx::query_as("SELECT id FROM devices WHERE device_identifier = ?")
                .bind(device_identifier)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((device_db_id,)) = device else {
            return Err(AccessError::NotFound);
        };

        sqlx::query("DELETE FROM user_devices WHERE user_id = ? AND device_id = ?")
            .bind(user_id)
            .bind(&device_db_id)
            .execute(&mut *tx)
            .await?;

        let remaining: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_devices WHERE device_id = ?")
                .bind(&device_db_id)
                .fetch_one(&mut *tx)
                .await?;

        if remaining.0 == 0 {
            sqlx::query("DELETE FROM devices WHERE id = ?")
                .bind(&device_db_id)
                .execute(&mut *tx)
                .await?;
            info!(device_id = %device_identifier, "Last access revoked, device removed");
        }

        tx.commit().await?;

        info!(device_id = %device_identifier, user_id = %user_id, "Access revoked");

        Ok(())
    }

    /// Grant a non-owner relation to the user behind `target_email`.
    /// Owner-only; the target must have logged in at least once.
    #[instrument(skip(self), fields(op = "ShareDevice"))]
    pub async fn share_device(
        &self,
        owner_id: &str,
        device_identifier: &str,
        target_email: &str,
    ) -> Result<(), AccessError> {
        let now = unix_timestamp();
        let mut tx = self.db.pool().begin().await?;

        let owner_relation: Option<(i64,)> = sqlx::query_as(
            "SELECT ud.is_owner FROM user_devices ud
             JOIN devices d ON d.id = ud.device_id
             WHERE ud.user_id = ? AND d.device_identifier = ?",
        )
        .bind(owner_id)
        .bind(device_identifier)
        .fetch_optional(&mut *tx)
        .await?;

        match owner_relation {
            Some((is_owner,)) if is_owner != 0 => {}
            _ => return Err(AccessError::Forbidden),
        }

        let target: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(target_email)
            .fetch_optional(&mut *tx)
            .await?;

        let Some((target_user_id,)) = target else {
            return Err(AccessError::TargetNotFound);
        };

        let device: (String,) = sqlx::query_as("SELECT id FROM devices WHERE device_identifier = ?")
            .bind(device_identifier)
            .fetch_one(&mut *tx)
            .await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM user_devices WHERE user_id = ? AND device_id = ?")
                .bind(&target_user_id)
                .bind(&device.0)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_some() {
            return Err(AccessError::AlreadyShared);
        }

        sqlx::query(
            "INSERT INTO user_devices (id, user_id, device_id, is_owner, added_at) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&target_user_id)
        .bind(&device.0)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            device_id = %device_identifier,
            owner_id = %owner_id,
            target = %target_email,
            "Device shared"
        );

        Ok(())
    }

    /// Read-only check used before dispatching commands: any relation,
    /// owner or shared viewer, authorizes control.
    #[instrument(skip(self), fields(op = "AuthorizeControl"))]
    pub async fn authorize_control(
        &self,
        user_id: &str,
        device_identifier: &str,
    ) -> Result<(), AccessError> {
        if self.db.has_access(user_id, device_identifier).await? {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }

    async fn enrich(&self, row: DeviceWithAccess) -> DeviceRecord {
        let snapshot = self.statuses.get(&row.device_identifier).await;
        DeviceRecord {
            device_identifier: row.device_identifier,
            name: row.name,
            created_at: row.created_at,
            is_owner: row.is_owner != 0,
            added_at: row.added_at,
            status: StatusView::from_snapshot(snapshot),
        }
    }
}

/// Default display name for a freshly claimed device.
fn default_device_name(device_identifier: &str) -> String {
    let tail_start = device_identifier
        .char_indices()
        .rev()
        .nth(3)
        .map_or(0, |(i, _)| i);
    format!("Solar Controller {}", &device_identifier[tail_start..])
}

#[cfg(test)]
mod tests {
    use super::default_device_name;

    #[test]
    fn uses_identifier_tail() {
        assert_eq!(default_device_name("ESP-01AB"), "Solar Controller 01AB");
        assert_eq!(default_device_name("AB"), "Solar Controller AB");
    }
}
