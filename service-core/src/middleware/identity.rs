//! Caller identity extraction for role-scoped operations.
//!
//! Token verification happens upstream: the authenticating gateway resolves
//! the bearer token and forwards the caller's identity in request headers.
//! This extractor only trusts those headers and enforces which roles may
//! invoke a given operation.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Caller role, resolved by the gateway from the signed identity claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Supervisor,
    Cashier,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Cashier => "cashier",
            Role::Customer => "customer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "supervisor" => Some(Role::Supervisor),
            "cashier" => Some(Role::Cashier),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

/// Identity extracted from gateway-set request headers.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Resolved customer/staff identifier.
    pub user_id: String,
    /// Role the gateway resolved for this caller.
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: String, role: Role) -> Self {
        Self { user_id, role }
    }

    /// The caller's id as a UUID. Gateways issue UUID subject ids; a
    /// malformed one means the request never came through the gateway.
    pub fn user_uuid(&self) -> Result<uuid::Uuid, AppError> {
        uuid::Uuid::parse_str(&self.user_id).map_err(|_| {
            AppError::Unauthorized(anyhow::anyhow!(
                "Caller id '{}' is not a valid UUID",
                self.user_id
            ))
        })
    }

    /// Check that the caller holds one of the allowed roles.
    pub fn require(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(anyhow::anyhow!(
                "Role '{}' is not permitted to perform this operation",
                self.role.as_str()
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing {} header (required from gateway)",
                    USER_ID_HEADER
                ))
            })?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing {} header (required from gateway)",
                    USER_ROLE_HEADER
                ))
            })?;

        let role = Role::parse(role).ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Unknown role '{}'", role))
        })?;

        // Add to tracing span for observability
        let span = tracing::Span::current();
        span.record("user_id", user_id);
        span.record("role", role.as_str());

        Ok(Identity::new(user_id.to_string(), role))
    }
}
