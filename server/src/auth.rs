//! Caller identity, as forwarded by the upstream auth guard.
//!
//! Token verification happens at the gateway in front of this service; the
//! verified identity reaches us as `x-user-id` / `x-user-role` headers.
//! Requests without both headers never come from the gateway and are
//! rejected outright.

use axum::http::request::Parts;
use axum::{async_trait, extract::FromRequestParts};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Chef,
    Admin,
}

impl Role {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Role::Customer),
            "chef" => Some(Role::Chef),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_str(parts, "x-user-id")
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or(ApiError::Unauthenticated)?;
        let role = header_str(parts, "x-user-role")
            .and_then(Role::parse)
            .ok_or(ApiError::Unauthenticated)?;

        Ok(Identity { user_id, role })
    }
}
