//! Build information reported in logs and by the health check. The
//! version is kept in step with the `registration` package.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const REVISION: Option<&str> = option_env!("REGISTRATION_REVISION");

pub const BUILD_TIMESTAMP: Option<&str> = option_env!("REGISTRATION_BUILD_TIMESTAMP");
