pub mod builtin;
pub mod catalog;
pub mod errors;
mod fs_util;
pub mod models;
pub mod platform;
pub mod plugin;
pub mod registry;
pub mod result;
pub mod task;
pub mod validation;
pub mod validator;

// Re-export key types at crate root for convenience.
pub use catalog::{Catalog, Owner};
pub use errors::{PreflightError, Result};
pub use models::{Credentials, Declaration, PlatformCredentials};
pub use platform::{RequiredPlatformValidator, REQUIRED_PLATFORM};
pub use plugin::{PluginBase, PluginInfo, DEFAULT_NAMESPACE};
pub use registry::{factory, ValidatorKind};
pub use result::ValidationResult;
pub use task::{load_credentials, load_task, parse_task, validate_task, TaskFile, WorkloadReport};
pub use validation::{ValidateOptions, ValidationType};
pub use validator::{ValidationContext, Validator, ValidatorError, ValidatorOutcome};
