//! Data models for SolarLink cloud storage.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub created_at: i64,
    pub last_login: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: String,
    pub device_identifier: String,
    pub name: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDevice {
    pub id: String,
    pub user_id: String,
    pub device_id: String,
    pub is_owner: i64,
    pub added_at: i64,
}

/// Join row of a device and the requesting user's access relation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceWithAccess {
    pub id: String,
    pub device_identifier: String,
    pub name: Option<String>,
    pub created_at: i64,
    pub is_owner: i64,
    pub added_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceHistoryRecord {
    pub id: i64,
    pub device_identifier: String,
    pub relay_state: i64,
    pub wifi_rssi: i64,
    pub uptime: i64,
    pub free_heap: i64,
    pub timestamp: i64,
}
