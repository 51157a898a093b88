use thiserror::Error;

/// Errors that can occur within the template store.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {owner}/{name}")]
    NotFound { owner: i64, name: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, TemplateError>;
