use crate::dtos::{
    ConsumeMaterialRequest, CreateMachineRequest, CreateMaterialRequest, MaterialResponse,
    UpdateMachineRequest, UpdateMaterialRequest, UpdateQuantityRequest,
};
use crate::models::{CreateMachine, CreateMaterial, MachineStatus, UpdateMachine};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use service_core::error::AppError;
use service_core::middleware::{Identity, Role};
use validator::Validate;

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

pub async fn create_material(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    payload.validate()?;

    if payload.unit_price < Decimal::ZERO {
        return Err(AppError::validation(
            "unit_price",
            "Unit price cannot be negative",
        ));
    }

    let material = state
        .db
        .create_material(&CreateMaterial {
            item_id: payload.item_id,
            item_name: payload.item_name,
            available_qty: payload.available_qty,
            unit_price: payload.unit_price,
            preorder_level: payload.preorder_level,
            images: payload.images,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn list_materials(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;

    let materials = state.db.list_materials().await?;
    Ok(Json(materials))
}

pub async fn get_material(
    State(state): State<AppState>,
    identity: Identity,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;

    let material = state
        .db
        .get_material(&item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Material '{}' not found", item_id)))?;
    let images = state.db.get_material_images(&item_id).await?;

    Ok(Json(MaterialResponse { material, images }))
}

/// Restock or correct a material. Quantity is absolute; the unit price
/// only changes when supplied.
pub async fn update_material(
    State(state): State<AppState>,
    identity: Identity,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    payload.validate()?;

    if let Some(price) = payload.unit_price {
        if price < Decimal::ZERO {
            return Err(AppError::validation(
                "unit_price",
                "Unit price cannot be negative",
            ));
        }
    }

    let material = state
        .db
        .update_material(&item_id, payload.available_qty, payload.unit_price)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Material '{}' not found", item_id)))?;

    Ok(Json(material))
}

/// Restock with absolute semantics, leaving the price alone.
pub async fn update_material_quantity(
    State(state): State<AppState>,
    identity: Identity,
    Path(item_id): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    payload.validate()?;

    let material = state
        .db
        .update_material(&item_id, payload.available_qty, None)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Material '{}' not found", item_id)))?;

    Ok(Json(material))
}

/// Draw stock for production. Insufficient stock is a conflict, and the
/// quantity never goes negative.
pub async fn consume_material(
    State(state): State<AppState>,
    identity: Identity,
    Path(item_id): Path<String>,
    Json(payload): Json<ConsumeMaterialRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    payload.validate()?;

    let material = state.db.consume_material(&item_id, payload.quantity).await?;

    Ok(Json(material))
}

pub async fn delete_material(
    State(state): State<AppState>,
    identity: Identity,
    Path(item_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin])?;

    let deleted = state.db.delete_material(&item_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Material '{}' not found",
            item_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Machines
// ---------------------------------------------------------------------------

pub async fn create_machine(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateMachineRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;
    payload.validate()?;

    if payload.hourly_rate < Decimal::ZERO {
        return Err(AppError::validation(
            "hourly_rate",
            "Hourly rate cannot be negative",
        ));
    }

    let machine = state
        .db
        .create_machine(&CreateMachine {
            machine_id: payload.machine_id,
            machine_name: payload.machine_name,
            hourly_rate: payload.hourly_rate,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(machine)))
}

pub async fn list_machines(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;

    let machines = state.db.list_machines().await?;
    Ok(Json(machines))
}

pub async fn update_machine(
    State(state): State<AppState>,
    identity: Identity,
    Path(machine_id): Path<String>,
    Json(payload): Json<UpdateMachineRequest>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor])?;

    let status = match payload.status.as_deref() {
        Some(s) => Some(MachineStatus::parse(s).ok_or_else(|| {
            AppError::validation(
                "status",
                "Status must be one of 'available', 'in_use', 'under_maintenance'",
            )
        })?),
        None => None,
    };

    let machine = state
        .db
        .update_machine(
            &machine_id,
            &UpdateMachine {
                machine_name: payload.machine_name,
                hourly_rate: payload.hourly_rate,
                status,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Machine '{}' not found", machine_id)))?;

    Ok(Json(machine))
}

pub async fn delete_machine(
    State(state): State<AppState>,
    identity: Identity,
    Path(machine_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin])?;

    let deleted = state.db.delete_machine(&machine_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Machine '{}' not found",
            machine_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}
