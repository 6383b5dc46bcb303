//! Error types shared by the loader, renderer and server

use std::io;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The content file for a post does not exist
    #[error("post not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The content file exists but could not be read as UTF-8 text
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The front-matter block is malformed
    #[error("invalid front-matter in {}: {message}", path.display())]
    FrontMatter { path: PathBuf, message: String },

    /// A post identifier that cannot name a file inside the content directory
    #[error("invalid post identifier {0:?}")]
    InvalidSlug(String),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    /// Every port in the retry budget was already taken
    #[error("could not find an available port in {first}..={last}")]
    PortsExhausted { first: u16, last: u16 },

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this error came from locating, reading or parsing a content file.
    ///
    /// The single-post route answers these with a 404 instead of a 500.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. }
                | Error::Read { .. }
                | Error::FrontMatter { .. }
                | Error::InvalidSlug(_)
        )
    }
}
