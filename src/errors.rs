use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents a failure to apply the schema migrations.
    #[error("Migration error")]
    Migration { source: sqlx::migrate::MigrateError },

    /// Represents a conflicting insert that left no row to report.
    #[error("No registrant found for phone number {phone_number}")]
    MissingRegistrant { phone_number: String },

    /// Represents a template that could not be registered.
    #[error("Template {name} is invalid")]
    InvalidTemplate {
        name: &'static str,
        source: handlebars::TemplateError,
    },

    /// Represents a failure to render a page.
    #[error("Failed to render {name}")]
    Render {
        name: String,
        source: handlebars::RenderError,
    },

    /// Represents a form body that could not be decoded.
    #[error("Malformed form submission")]
    MalformedFormSubmission,

    /// Represents a form body over the size limit.
    #[error("Form submission too large")]
    PayloadTooLarge,

    /// Represents an unusable token-signing secret.
    #[error("The secret key must not be empty")]
    InvalidSecret,
}
