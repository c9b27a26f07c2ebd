pub type ChoreoResult<T> = Result<T, ChoreoError>;

/// Errors raised while building or playing a scene.
///
/// Construction errors come from [`crate::build`]: unknown style keys, missing variables, unbound
/// references. Authoring errors surface while a script runs: restore without save, binding cycles,
/// tweening a property toward a value of another kind.
#[derive(thiserror::Error, Debug)]
pub enum ChoreoError {
    #[error("construction error: {0}")]
    Construction(String),

    #[error("authoring error: {0}")]
    Authoring(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChoreoError {
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    pub fn authoring(msg: impl Into<String>) -> Self {
        Self::Authoring(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Re-tag as a construction error, prefixing `context` to the message.
    pub(crate) fn at_build(self, context: impl std::fmt::Display) -> Self {
        let msg = match self {
            Self::Construction(m) | Self::Authoring(m) | Self::Validation(m) | Self::Serde(m) => m,
            Self::Other(e) => format!("{e:#}"),
        };
        Self::Construction(format!("{context}: {msg}"))
    }

    /// A fresh error with the same variant and message.
    pub(crate) fn replay(&self) -> Self {
        match self {
            Self::Construction(m) => Self::Construction(m.clone()),
            Self::Authoring(m) => Self::Authoring(m.clone()),
            Self::Validation(m) => Self::Validation(m.clone()),
            Self::Serde(m) => Self::Serde(m.clone()),
            Self::Other(e) => Self::Other(anyhow::anyhow!("{e:#}")),
        }
    }

    /// Return `true` for errors that point at a mistake in the scene script itself.
    pub fn is_authoring(&self) -> bool {
        matches!(self, Self::Authoring(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
