//! Caller identity for business modules.
//!
//! Modules do not authenticate anyone. They receive an [`Actor`] resolved
//! from the request by a pluggable [`ActorResolver`] and enforce role
//! checks on top of it. The concrete resolver is injected at startup.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Factory role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Operator,
    Supervisor,
    Manager,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "OPERATOR",
            Role::Supervisor => "SUPERVISOR",
            Role::Manager => "MANAGER",
            Role::Owner => "OWNER",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "OPERATOR" => Some(Role::Operator),
            "SUPERVISOR" => Some(Role::Supervisor),
            "MANAGER" => Some(Role::Manager),
            "OWNER" => Some(Role::Owner),
            _ => None,
        }
    }
}

/// The resolved caller of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// User id, unique within the scope.
    pub id: String,
    pub role: Role,
    /// Tenant (factory/company) the actor belongs to. All reads and
    /// writes are confined to this scope.
    pub scope_id: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role, scope_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            scope_id: scope_id.into(),
        }
    }
}

/// Pluggable identity resolver. Called once per request before the
/// handler runs.
pub trait ActorResolver: Send + Sync + 'static {
    fn resolve(&self, headers: &HeaderMap) -> Result<Actor, ServiceError>;
}

/// Resolver that trusts identity headers set by an upstream gateway.
///
/// Reads `x-actor-id`, `x-actor-role` and `x-actor-scope` by default;
/// deployments whose edge sets different header names configure them with
/// [`HeaderResolver::with_headers`]. Requests without the headers are
/// rejected as unauthenticated.
pub struct HeaderResolver {
    id_header: String,
    role_header: String,
    scope_header: String,
}

pub const HEADER_ACTOR_ID: &str = "x-actor-id";
pub const HEADER_ACTOR_ROLE: &str = "x-actor-role";
pub const HEADER_ACTOR_SCOPE: &str = "x-actor-scope";

impl Default for HeaderResolver {
    fn default() -> Self {
        Self::with_headers(HEADER_ACTOR_ID, HEADER_ACTOR_ROLE, HEADER_ACTOR_SCOPE)
    }
}

impl HeaderResolver {
    pub fn with_headers(
        id: impl Into<String>,
        role: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            id_header: id.into(),
            role_header: role.into(),
            scope_header: scope.into(),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ServiceError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized(format!("missing {name} header")))
}

impl ActorResolver for HeaderResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<Actor, ServiceError> {
        let id = header_str(headers, &self.id_header)?;
        let role_raw = header_str(headers, &self.role_header)?;
        let scope_id = header_str(headers, &self.scope_header)?;
        let role = Role::parse(role_raw).ok_or_else(|| {
            ServiceError::Unauthorized(format!("unknown role: {role_raw}"))
        })?;
        Ok(Actor::new(id, role, scope_id))
    }
}

/// Resolver that returns one fixed actor. Used for testing.
pub struct StaticResolver(pub Actor);

impl ActorResolver for StaticResolver {
    fn resolve(&self, _headers: &HeaderMap) -> Result<Actor, ServiceError> {
        Ok(self.0.clone())
    }
}
