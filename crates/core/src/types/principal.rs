//! Authenticated users and admins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::email::Email;
use super::id::UserId;
use super::status::Role;

/// The profile attached to a session token.
///
/// Fields the client does not model are kept in `extra` so that a profile
/// written to storage and read back is unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(alias = "_id")]
    pub id: UserId,
    #[serde(default, alias = "username")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Principal {
    /// Name to greet the principal with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.email.as_ref().map(Email::as_str))
            .unwrap_or_else(|| self.id.as_str())
    }
}

/// Body returned by the login and signup endpoints.
///
/// Customer endpoints return the profile as `user`, admin endpoints as
/// `admin`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(alias = "admin")]
    pub user: Principal,
}

/// Body of the login endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: Email,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_fields_survive_roundtrip() {
        let json = r#"{"id":"u1","name":"Ana","role":"admin","avatar":"/a.png"}"#;
        let principal: Principal = serde_json::from_str(json).unwrap();
        assert_eq!(principal.role, Role::Admin);
        assert_eq!(principal.extra.get("avatar"), Some(&Value::from("/a.png")));

        let back: Principal =
            serde_json::from_str(&serde_json::to_string(&principal).unwrap()).unwrap();
        assert_eq!(back, principal);
    }

    #[test]
    fn test_admin_alias() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{"token":"t","admin":{"id":1,"email":"a@b.co"}}"#).unwrap();
        assert_eq!(resp.user.display_name(), "a@b.co");
        assert_eq!(resp.user.role, Role::Customer);
    }
}
