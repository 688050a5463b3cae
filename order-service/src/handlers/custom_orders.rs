use crate::dtos::CustomOrderResponse;
use crate::models::{CreateCustomOrder, ItemType, NewDesignFile, PaymentOption};
use crate::services::metrics::{CUSTOM_ORDERS_TOTAL, PAYMENT_AMOUNT_TOTAL};
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use service_core::error::AppError;
use service_core::middleware::{Identity, Role};
use std::str::FromStr;

const MAX_DESIGN_FILE_BYTES: usize = 20 * 1024 * 1024;

/// Custom order intake: multipart form with the order fields plus zero or
/// more design files. Customers place their own orders; cashiers handle
/// walk-ins. Files land on disk first; if the database write then fails,
/// the stored files are removed again.
pub async fn create_custom_order(
    State(state): State<AppState>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Cashier, Role::Customer])?;

    // Any failure past the first stored file must remove everything already
    // written to disk, so the whole intake runs inside one fallible block
    // with a single cleanup point after it.
    let mut stored_files: Vec<NewDesignFile> = Vec::new();

    let outcome = async {
        let mut customer_name: Option<String> = None;
        let mut item_type: Option<ItemType> = None;
        let mut quantity: Option<i32> = None;
        let mut service_charge = Decimal::ZERO;
        let mut payment_option: Option<PaymentOption> = None;

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })? {
            let name = field.name().unwrap_or("").to_string();

            if field.file_name().is_some() {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field.content_type().map(|ct| ct.to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read file bytes: {}", e))
                })?;

                if data.len() > MAX_DESIGN_FILE_BYTES {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "Design file '{}' too large (max 20MB)",
                        file_name
                    )));
                }

                let stored = state.files.store(&file_name, content_type, &data).await?;
                stored_files.push(stored);
                continue;
            }

            let value = field.text().await.map_err(|e| {
                AppError::BadRequest(anyhow::anyhow!("Failed to read field '{}': {}", name, e))
            })?;

            match name.as_str() {
                "customer_name" => customer_name = Some(value),
                "item_type" => {
                    item_type = Some(ItemType::parse(&value).ok_or_else(|| {
                        AppError::validation(
                            "item_type",
                            "Item type must be one of 'medal', 'badge', 'mug', 'souvenir'",
                        )
                    })?)
                }
                "quantity" => {
                    quantity = Some(value.parse::<i32>().map_err(|_| {
                        AppError::validation("quantity", "Quantity must be an integer")
                    })?)
                }
                "service_charge" => {
                    service_charge = Decimal::from_str(&value).map_err(|_| {
                        AppError::validation("service_charge", "Service charge must be a number")
                    })?
                }
                "payment_option" => {
                    payment_option = Some(PaymentOption::parse(&value).ok_or_else(|| {
                        AppError::validation(
                            "payment_option",
                            "Payment option must be 'full' or 'advance'",
                        )
                    })?)
                }
                _ => {}
            }
        }

        let mut input = validate_order_fields(
            customer_name,
            item_type,
            quantity,
            service_charge,
            payment_option,
        )?;
        input.design_files = stored_files.clone();

        state.db.create_custom_order(&input).await
    }
    .await;

    let (order, design_files) = match outcome {
        Ok(created) => created,
        Err(e) => {
            state.files.remove(&stored_files).await;
            return Err(e);
        }
    };

    CUSTOM_ORDERS_TOTAL
        .with_label_values(&[order.item_type.as_str()])
        .inc();
    PAYMENT_AMOUNT_TOTAL
        .with_label_values(&["custom_order"])
        .inc_by(order.amount_paid.to_f64().unwrap_or(0.0));

    Ok((
        StatusCode::CREATED,
        Json(CustomOrderResponse {
            order,
            design_files,
        }),
    ))
}

fn validate_order_fields(
    customer_name: Option<String>,
    item_type: Option<ItemType>,
    quantity: Option<i32>,
    service_charge: Decimal,
    payment_option: Option<PaymentOption>,
) -> Result<CreateCustomOrder, AppError> {
    let customer_name = customer_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::validation("customer_name", "Customer name is required"))?;
    let item_type =
        item_type.ok_or_else(|| AppError::validation("item_type", "Item type is required"))?;
    let quantity =
        quantity.ok_or_else(|| AppError::validation("quantity", "Quantity is required"))?;
    if quantity < 1 {
        return Err(AppError::validation(
            "quantity",
            "Quantity must be at least 1",
        ));
    }
    if service_charge < Decimal::ZERO {
        return Err(AppError::validation(
            "service_charge",
            "Service charge cannot be negative",
        ));
    }
    let payment_option = payment_option.ok_or_else(|| {
        AppError::validation("payment_option", "Payment option is required")
    })?;

    Ok(CreateCustomOrder {
        customer_name,
        item_type,
        quantity,
        service_charge,
        payment_option,
        design_files: Vec::new(),
    })
}

pub async fn list_custom_orders(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;

    let orders = state.db.list_custom_orders().await?;
    Ok(Json(orders))
}

pub async fn get_custom_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    identity.require(&[Role::Admin, Role::Supervisor, Role::Cashier])?;

    let order = state
        .db
        .get_custom_order(&request_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Custom order '{}' not found", request_id))
        })?;
    let design_files = state.db.get_design_files(&request_id).await?;

    Ok(Json(CustomOrderResponse {
        order,
        design_files,
    }))
}
