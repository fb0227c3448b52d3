//! Credential checks for the platform a plugin runs against.

use crate::models::PlatformCredentials;
use crate::validator::{Arguments, ValidationContext, Validator, ValidatorError, ValidatorOutcome};

/// Registered name of [`RequiredPlatformValidator`].
pub const REQUIRED_PLATFORM: &str = "required_platform";

pub(crate) const DESCRIPTION: &str = "Validates credentials for specified platform.\n\
    A plugin may require the platform with admin, with admin and users, or with users only.\n\
    Arguments: platform (name of the platform), admin (requires admin credential), \
    users (requires user credentials).";

/// Checks that the deployment has admin and/or user credentials for a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredPlatformValidator {
    pub platform: String,
    pub admin: bool,
    pub users: bool,
}

impl RequiredPlatformValidator {
    #[must_use]
    pub fn new(platform: impl Into<String>, admin: bool, users: bool) -> Self {
        Self {
            platform: platform.into(),
            admin,
            users,
        }
    }

    /// Build from declaration arguments `(platform, admin=false, users=false)`.
    pub fn from_args(args: &Arguments<'_>) -> Result<Self, ValidatorError> {
        args.expect_only(&["platform", "admin", "users"])?;
        Ok(Self::new(
            args.required_str(0, "platform")?,
            args.bool_or(1, "admin", false)?,
            args.bool_or(2, "users", false)?,
        ))
    }
}

impl Validator for RequiredPlatformValidator {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorOutcome {
        if !(self.admin || self.users) {
            return self.fail("You should specify admin=True or users=True or both.");
        }

        let empty = PlatformCredentials::default();
        let creds = ctx
            .credentials
            .and_then(|all| all.get(&self.platform))
            .unwrap_or(&empty);

        if self.admin && creds.admin.is_none() {
            return self.fail(format!("No admin credential for {}", self.platform));
        }
        // Without users the users context can still create them from the admin.
        if self.users && creds.users.is_empty() && creds.admin.is_none() {
            return self.fail(format!("No user credentials for {}", self.platform));
        }
        Ok(None)
    }
}
