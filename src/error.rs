use thiserror::Error;

/// Failure to assemble a [`LicenseGraph`](crate::graph::LicenseGraph).
///
/// Construction is all-or-nothing: the first error aborts the read and no
/// partial graph is returned.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("no root files provided")]
    NoRoots,

    #[error("unable to read license metadata {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed license metadata {path}")]
    Malformed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{target} depends on unknown file {dependency}")]
    UnknownDependency { target: String, dependency: String },

    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("license metadata reader task failed")]
    Worker(#[from] tokio::task::JoinError),
}

impl ReadError {
    /// The metadata file the error concerns, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ReadError::Io { path, .. } | ReadError::Malformed { path, .. } => Some(path),
            ReadError::UnknownDependency { target, .. } => Some(target),
            _ => None,
        }
    }
}
