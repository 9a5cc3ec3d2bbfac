use serde::Deserialize;

use super::password::check_new_password;
use crate::forms::{is_blank, is_valid_email, is_valid_username, FormErrors, REQUIRED};

/// Query string of `GET /auth/login/`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Body of `POST /auth/login/`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Body of `POST /auth/signup/`.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Trims whitespace and lowercases the email.
    pub fn normalize(&mut self) {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if is_blank(&self.username) {
            errors.add("username", REQUIRED);
        } else if !is_valid_username(&self.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        if !self.email.is_empty() && !is_valid_email(&self.email) {
            errors.add("email", "Enter a valid email address.");
        }
        for problem in check_new_password(&self.password1, &self.password2) {
            errors.add("password2", problem);
        }
        errors.into_result()
    }
}

/// Body of `POST /auth/password_change/`.
#[derive(Debug, Default, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

impl PasswordChangeForm {
    pub fn validate_new(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        for problem in check_new_password(&self.new_password1, &self.new_password2) {
            errors.add("new_password2", problem);
        }
        errors.into_result()
    }
}

/// Body of `POST /auth/password_reset/`.
#[derive(Debug, Default, Deserialize)]
pub struct PasswordResetForm {
    #[serde(default)]
    pub email: String,
}

impl PasswordResetForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        let email = self.email.trim();
        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !is_valid_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
        errors.into_result()
    }
}

/// Body of `POST /auth/reset/{uid}/{token}/`.
#[derive(Debug, Default, Deserialize)]
pub struct SetPasswordForm {
    #[serde(default)]
    pub new_password1: String,
    #[serde(default)]
    pub new_password2: String,
}

impl SetPasswordForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        for problem in check_new_password(&self.new_password1, &self.new_password2) {
            errors.add("new_password2", problem);
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_signup() -> SignupForm {
        SignupForm {
            first_name: " Leo ".into(),
            last_name: "Tolstoy".into(),
            username: " leo ".into(),
            email: "Leo@Example.com".into(),
            password1: "war-and-peace".into(),
            password2: "war-and-peace".into(),
        }
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        let mut form = valid_signup();
        form.normalize();
        assert_eq!(form.username, "leo");
        assert_eq!(form.first_name, "Leo");
        assert_eq!(form.email, "leo@example.com");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn signup_reports_each_bad_field() {
        let form = SignupForm {
            username: "bad name".into(),
            email: "nope".into(),
            password1: "short".into(),
            password2: "other".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.field("username").len(), 1);
        assert_eq!(errors.field("email").len(), 1);
        assert_eq!(errors.field("password2").len(), 2);
    }

    #[test]
    fn email_is_optional() {
        let mut form = valid_signup();
        form.email.clear();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn reset_request_needs_an_email() {
        assert!(PasswordResetForm { email: " leo@example.com ".into() }.validate().is_ok());
        let blank = PasswordResetForm::default().validate().unwrap_err();
        assert_eq!(blank.field("email"), [REQUIRED.to_string()]);
        assert_eq!(
            PasswordResetForm { email: "leo".into() }.validate().unwrap_err().field("email").len(),
            1
        );
    }

    #[test]
    fn set_password_checks_rules() {
        let ok = SetPasswordForm {
            new_password1: "anna-karenina".into(),
            new_password2: "anna-karenina".into(),
        };
        assert!(ok.validate().is_ok());
        let bad = SetPasswordForm {
            new_password1: "123".into(),
            new_password2: "124".into(),
        };
        assert_eq!(bad.validate().unwrap_err().field("new_password2").len(), 3);
    }
}
