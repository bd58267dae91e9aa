//! Error types for body generation.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;

/// Broad category of a [`GenError`].
///
/// Batch generation logs it with every failed body; every category aborts
/// the body it happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration, detected at construction or dispatch time.
    Configuration,
    /// An external mesh tool failed.
    ExternalTool,
    /// A template slot could not be bound.
    TemplateBinding,
    /// Filesystem failure while reading or writing generation output.
    Filesystem,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::ExternalTool => "external tool",
            ErrorKind::TemplateBinding => "template binding",
            ErrorKind::Filesystem => "filesystem",
        })
    }
}

/// Errors that can occur while generating bodies.
#[derive(Debug, Error)]
pub enum GenError {
    /// A sampling range has `lo > hi` or a non-finite bound.
    #[error("invalid range [{lo}, {hi}] for '{attribute}'")]
    InvalidRange {
        /// The attribute the range configures.
        attribute: String,
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
    },

    /// The library mesh provider was given no candidate meshes.
    #[error("mesh pool for link '{link}' is empty")]
    EmptyMeshPool {
        /// The link the pool was meant for.
        link: String,
    },

    /// No mesh converter binary exists for the host OS.
    #[error("unsupported host platform '{os}' for mesh conversion")]
    UnsupportedPlatform {
        /// The host OS name.
        os: String,
    },

    /// Unknown body kind selector.
    #[error("unknown body kind '{0}'")]
    UnknownBodyKind(String),

    /// Unknown solid kind selector.
    #[error("unknown solid kind '{0}'")]
    UnknownSolidKind(String),

    /// A dependent link has no placement policy.
    #[error("link '{link}' of body '{body}' has no placement")]
    MissingPlacement {
        /// The body name.
        body: String,
        /// The unplaced link.
        link: String,
    },

    /// A link referenced by name does not exist in the body.
    #[error("body '{body}' has no link named '{link}'")]
    UnknownLink {
        /// The body name.
        body: String,
        /// The missing link name.
        link: String,
    },

    /// Configuration text or file could not be understood.
    #[error("invalid configuration in '{source_name}': {message}")]
    Config {
        /// Where the configuration came from.
        source_name: String,
        /// What went wrong.
        message: String,
    },

    /// The worker pool for parallel batches could not start.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// An external tool could not be run, exited abnormally, or produced
    /// no output.
    #[error("external tool '{tool}' failed: {reason}")]
    ExternalTool {
        /// The tool name.
        tool: String,
        /// What went wrong.
        reason: String,
    },

    /// A template slot has no value to bind.
    #[error("template slot '{slot}' has no value")]
    UnboundSlot {
        /// The slot name.
        slot: String,
    },

    /// A template slot can never be bound by its consumer.
    #[error("template slot '{slot}' is not provided by {consumer}")]
    UnknownSlot {
        /// The slot name.
        slot: String,
        /// Who renders the template.
        consumer: String,
    },

    /// A template has unbalanced braces.
    #[error("malformed template at byte {offset}: {message}")]
    MalformedTemplate {
        /// Byte offset of the problem.
        offset: usize,
        /// What went wrong.
        message: &'static str,
    },

    /// A body output directory already exists.
    #[error("output directory '{}' already exists", path.display())]
    OutputExists {
        /// The existing directory.
        path: PathBuf,
    },

    /// I/O error during file operations.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl GenError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange { .. }
            | Self::EmptyMeshPool { .. }
            | Self::UnsupportedPlatform { .. }
            | Self::UnknownBodyKind(_)
            | Self::UnknownSolidKind(_)
            | Self::MissingPlacement { .. }
            | Self::UnknownLink { .. }
            | Self::Config { .. }
            | Self::WorkerPool(_) => ErrorKind::Configuration,
            Self::ExternalTool { .. } => ErrorKind::ExternalTool,
            Self::UnboundSlot { .. } | Self::UnknownSlot { .. } | Self::MalformedTemplate { .. } => {
                ErrorKind::TemplateBinding
            }
            Self::OutputExists { .. } | Self::Io { .. } => ErrorKind::Filesystem,
        }
    }

    /// Wrap an I/O error with the path it happened at.
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| Self::Io { path, source }
    }
}
