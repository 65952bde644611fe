use thiserror::Error;

/// Result type for backend operations.
pub type BackendResult<T = ()> = Result<T, BackendError>;

/// A backend refused or failed an audio-graph operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl From<String> for BackendError {
    fn from(s: String) -> Self {
        BackendError(s)
    }
}

impl From<&str> for BackendError {
    fn from(s: &str) -> Self {
        BackendError(s.to_string())
    }
}

/// Which external asset an operation depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    ImpulseResponse,
    Sample,
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::ImpulseResponse => write!(f, "impulse response"),
            AssetKind::Sample => write!(f, "sample"),
        }
    }
}

/// Asset failures are never fatal: the dependent branch stays silent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("failed to decode {asset}: {reason}")]
    Decode { asset: AssetKind, reason: String },
    #[error("{0} buffer is empty")]
    Empty(AssetKind),
    #[error("{asset} rejected by backend: {source}")]
    Backend {
        asset: AssetKind,
        #[source]
        source: BackendError,
    },
}
