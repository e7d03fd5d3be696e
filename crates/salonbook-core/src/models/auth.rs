//! Request and response bodies for the `/api/auth` endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::User;

/// Account type chosen on the login and signup forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    SalonAdmin,
    Customer,
}

impl AccountType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "salon_admin" | "salon" | "admin" => Some(AccountType::SalonAdmin),
            "customer" => Some(AccountType::Customer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: AccountType,
}

/// Registration reply. The backend does not commit to a shape.
pub type RegisterResponse = Map<String, Value>;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userType")]
    pub user_type: AccountType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
