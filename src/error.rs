//! Error taxonomy for scene loading, alignment resolution and warping.

/// Convenience result type used across scorewarp.
pub type WarpResult<T> = Result<T, WarpError>;

/// Errors that stop a warp. Anything local to one element is logged and
/// skipped instead of surfacing here.
#[derive(thiserror::Error, Debug)]
pub enum WarpError {
    /// A scene size, view window or layout offset is missing or unusable.
    #[error("scene metrics error: {0}")]
    Metrics(String),

    /// No alignment record survived filtering, so there is nothing to warp to.
    #[error("no valid alignment record found")]
    NoValidRecord,

    /// SVG text could not be loaded into a scene.
    #[error("scene error: {0}")]
    Scene(String),

    /// Alignment data could not be decoded.
    #[error("alignment error: {0}")]
    Alignment(String),

    /// A warp was requested before any alignment was loaded.
    #[error("no alignment loaded")]
    NotLoaded,
}

impl WarpError {
    /// Build a [`WarpError::Metrics`] value.
    pub fn metrics(msg: impl Into<String>) -> Self {
        Self::Metrics(msg.into())
    }

    /// Build a [`WarpError::Scene`] value.
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    /// Build a [`WarpError::Alignment`] value.
    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(WarpError::metrics("x").to_string().contains("scene metrics error:"));
        assert!(WarpError::scene("x").to_string().contains("scene error:"));
        assert!(WarpError::alignment("x").to_string().contains("alignment error:"));
        assert_eq!(
            WarpError::NoValidRecord.to_string(),
            "no valid alignment record found"
        );
    }
}
