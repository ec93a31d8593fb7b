//! Error types for the markdown-math library.

use thiserror::Error;

/// Result type alias for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while loading or merging plugin options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid front matter: {0}")]
    FrontMatter(String),

    #[error("Invalid TOML: {0}")]
    Toml(String),

    #[error("Invalid math options: {0}")]
    Options(String),
}

/// Errors that occur while rendering math.
///
/// Recognized TeX syntax errors never show up here: backends turn them into
/// error markup. These variants are the failures the host has to see.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Math engine error: {0}")]
    Engine(String),

    #[error("Invalid renderer options: {0}")]
    Options(String),
}
