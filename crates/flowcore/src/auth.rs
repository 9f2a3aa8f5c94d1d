use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthType {
    #[serde(rename = "api_key")]
    ApiKey,
    #[serde(rename = "basic_auth")]
    BasicAuth,
    #[serde(rename = "bearer_token")]
    BearerToken,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "jwt")]
    Jwt,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::ApiKey => "api_key",
            AuthType::BasicAuth => "basic_auth",
            AuthType::BearerToken => "bearer_token",
            AuthType::OAuth2 => "oauth2",
            AuthType::Jwt => "jwt",
        }
    }
}

/// Decrypted credential bundle handed out by an `AuthConfigStore`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub auth_type: AuthType,
    pub data: Value,
}

impl AuthConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        auth_type: AuthType,
        data: Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            auth_type,
            data,
        }
    }

    /// Summary safe to put in node output and logs.
    pub fn summary(&self) -> Value {
        json!({
            "type": self.auth_type.as_str(),
            "configId": self.id,
            "name": self.name,
        })
    }

    /// Typed view of `data` for the configured auth type.
    pub fn credentials(&self) -> Result<Credentials, serde_json::Error> {
        let data = self.data.clone();
        Ok(match self.auth_type {
            AuthType::ApiKey => Credentials::ApiKey(serde_json::from_value(data)?),
            AuthType::BasicAuth => Credentials::Basic(serde_json::from_value(data)?),
            AuthType::BearerToken => Credentials::Bearer(serde_json::from_value(data)?),
            AuthType::OAuth2 => Credentials::OAuth2(serde_json::from_value(data)?),
            AuthType::Jwt => Credentials::Unsupported(AuthType::Jwt),
        })
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("auth_type", &self.auth_type)
            .field("data", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Credentials {
    ApiKey(ApiKeyCredentials),
    Basic(BasicCredentials),
    Bearer(BearerCredentials),
    OAuth2(OAuth2Credentials),
    Unsupported(AuthType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPlacement {
    Header,
    Query,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyCredentials {
    pub key_name: String,
    pub key_value: String,
    pub placement: KeyPlacement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BearerCredentials {
    pub token: String,
}

/// Only the access token is used; there is no refresh flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Credentials {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}
