//! Client-side checks run before any credentials leave the device.

use thiserror::Error;

use crate::models::{AccountType, LoginRequest, RegisterRequest};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Please select Salon or Customer")]
    MissingAccountType,

    #[error("Email is required")]
    MissingEmail,

    #[error("Password is required")]
    MissingPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub account_type: Option<AccountType>,
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FormError> {
        let user_type = self.account_type.ok_or(FormError::MissingAccountType)?;
        let email = self.email.trim();
        if email.is_empty() {
            return Err(FormError::MissingEmail);
        }
        if self.password.is_empty() {
            return Err(FormError::MissingPassword);
        }
        Ok(LoginRequest {
            email: email.to_string(),
            password: self.password.clone(),
            user_type,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub account_type: Option<AccountType>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        let role = self.account_type.ok_or(FormError::MissingAccountType)?;
        let email = self.email.trim();
        if email.is_empty() {
            return Err(FormError::MissingEmail);
        }
        if self.password.is_empty() {
            return Err(FormError::MissingPassword);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        Ok(RegisterRequest {
            name: self.name.trim().to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            phone: self.phone.trim().to_string(),
            role,
        })
    }
}
