//! Material and machine catalog models for order-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Material row. `available_qty` never goes below zero; consumption is an
/// atomic conditional decrement that fails on insufficient stock.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Material {
    pub item_id: String,
    pub item_name: String,
    pub available_qty: i32,
    pub unit_price: Decimal,
    pub preorder_level: i32,
    pub created_utc: DateTime<Utc>,
}

impl Material {
    /// Low-stock flag: quantity at or below the preorder level.
    pub fn is_low_stock(&self) -> bool {
        self.available_qty <= self.preorder_level
    }
}

/// Image record attached to a material.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaterialImage {
    pub image_id: Uuid,
    pub item_id: String,
    pub image_path: String,
}

/// Input for adding a material.
#[derive(Debug, Clone)]
pub struct CreateMaterial {
    pub item_id: String,
    pub item_name: String,
    pub available_qty: i32,
    pub unit_price: Decimal,
    pub preorder_level: i32,
    pub images: Vec<String>,
}

/// Machine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineStatus {
    Available,
    InUse,
    UnderMaintenance,
}

impl MachineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Available => "available",
            MachineStatus::InUse => "in_use",
            MachineStatus::UnderMaintenance => "under_maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(MachineStatus::Available),
            "in_use" => Some(MachineStatus::InUse),
            "under_maintenance" => Some(MachineStatus::UnderMaintenance),
            _ => None,
        }
    }
}

/// Machine row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Machine {
    pub machine_id: String,
    pub machine_name: String,
    pub hourly_rate: Decimal,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

/// Input for adding a machine.
#[derive(Debug, Clone)]
pub struct CreateMachine {
    pub machine_id: String,
    pub machine_name: String,
    pub hourly_rate: Decimal,
}

/// Input for updating a machine.
#[derive(Debug, Clone)]
pub struct UpdateMachine {
    pub machine_name: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub status: Option<MachineStatus>,
}
