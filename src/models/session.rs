//! Session claims, roles and capabilities

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Staff roles recognised by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Security,
}

/// Actions a protected route may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewVisitors,
    RecordVisits,
    DeleteVisits,
    ExportReports,
    ViewAnalytics,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewVisitors => "view visitors",
            Capability::RecordVisits => "record visits",
            Capability::DeleteVisits => "delete visits",
            Capability::ExportReports => "export reports",
            Capability::ViewAnalytics => "view analytics",
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Security => "security",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => &[
                Capability::ViewVisitors,
                Capability::RecordVisits,
                Capability::DeleteVisits,
                Capability::ExportReports,
                Capability::ViewAnalytics,
            ],
            Role::Security => &[
                Capability::ViewVisitors,
                Capability::RecordVisits,
                Capability::ExportReports,
            ],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "security" => Ok(Role::Security),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// JWT claims carried by an authenticated staff session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub user_id: i32,
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Sign the claims into an HS256 token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a token (signature and expiry)
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Fail with 403 unless the session's role holds `capability`
    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Role '{}' may not {}",
                self.role,
                capability.as_str()
            )))
        }
    }
}
