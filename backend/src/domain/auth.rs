//! Login credentials.
//!
//! Inbound adapters build [`LoginCredentials`] from raw strings before they
//! reach the login service, so the service only ever sees a well-formed email
//! and a non-empty password.

use std::fmt;

use zeroize::Zeroizing;

use super::account::EmailAddress;

/// Reasons a login payload is rejected before authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was blank or malformed.
    InvalidEmail,
    /// Password was empty.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email must be a valid email address"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// The password is wiped from memory when the value is dropped.
///
/// # Examples
/// ```
/// use account_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("jane@example.com", "s3cret").unwrap();
/// assert_eq!(creds.email().as_str(), "jane@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    ///
    /// Surrounding whitespace in the email is ignored; the password is kept
    /// verbatim.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email =
            EmailAddress::new(email.trim()).map_err(|_| LoginValidationError::InvalidEmail)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::InvalidEmail)]
    #[case("not-an-email", "pw", LoginValidationError::InvalidEmail)]
    #[case("jane@example.com", "", LoginValidationError::EmptyPassword)]
    fn rejects_invalid_parts(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password).expect_err("invalid parts");
        assert_eq!(err, expected);
    }

    #[test]
    fn keeps_password_whitespace() {
        let creds =
            LoginCredentials::try_from_parts(" jane@example.com ", " pw ").expect("valid parts");
        assert_eq!(creds.email().as_str(), "jane@example.com");
        assert_eq!(creds.password(), " pw ");
    }
}
