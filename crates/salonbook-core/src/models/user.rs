use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Account role as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SalonAdmin,
    Customer,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SalonAdmin => "salon_admin",
            UserRole::Customer => "customer",
            UserRole::Unknown => "unknown",
        }
    }
}

/// The signed-in user. Replaced wholesale, never merged field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    /// Fields the backend sends that have no typed slot here
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn is_salon_admin(&self) -> bool {
        self.role == Some(UserRole::SalonAdmin)
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Unknown user")
    }
}

/// Backends disagree on whether ids are strings or integers
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_keeps_unknown_fields() {
        let json = r#"{"id":"1","name":"Ana","email":"a@x.com","role":"customer","phone":"555"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.id.as_deref(), Some("1"));
        assert_eq!(user.role, Some(UserRole::Customer));
        assert_eq!(user.extra.get("phone"), Some(&Value::String("555".to_string())));
    }

    #[test]
    fn test_parse_numeric_id_and_null_role() {
        let user: User = serde_json::from_str(r#"{"id":42,"role":null}"#).unwrap();
        assert_eq!(user.id.as_deref(), Some("42"));
        assert_eq!(user.role, None);
        assert_eq!(user.display_name(), "Unknown user");
    }

    #[test]
    fn test_unrecognised_role_is_unknown() {
        let user: User = serde_json::from_str(r#"{"role":"stylist"}"#).unwrap();
        assert_eq!(user.role, Some(UserRole::Unknown));
        assert!(!user.is_salon_admin());
    }

    #[test]
    fn test_salon_admin_role() {
        let user: User = serde_json::from_str(r#"{"role":"salon_admin","email":"s@x.com"}"#).unwrap();
        assert!(user.is_salon_admin());
        assert_eq!(user.display_name(), "s@x.com");
    }
}
