use std::fmt;

use serde::Serialize;

use crate::catalog::ErrorKind;

pub type AppResult<T> = Result<T, AppError>;

/// Where a fault was first classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Handler,
    Domain,
    Repository,
    Infrastructure,
    Client,
    Internal,
    Database,
    Authentication,
    InvalidArgument,
}

impl Layer {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handler => "handler",
            Self::Domain => "domain",
            Self::Repository => "repository",
            Self::Infrastructure => "infrastructure",
            Self::Client => "client",
            Self::Internal => "internal",
            Self::Database => "database",
            Self::Authentication => "authentication",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified application error.
///
/// Created at the point a fault is first observed. The original cause stays reachable through
/// [`AppError::cause`], [`AppError::downcast_ref`] and [`std::error::Error::source`].
pub struct AppError {
    kind: ErrorKind,
    layer: Layer,
    source: anyhow::Error,
}

impl AppError {
    pub fn new(kind: ErrorKind, layer: Layer, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            layer,
            source: source.into(),
        }
    }

    /// Classify with the catalog's default layer for `kind`.
    pub fn from_kind(kind: ErrorKind, source: impl Into<anyhow::Error>) -> Self {
        Self::new(kind, kind.default_layer(), source)
    }

    #[must_use]
    pub fn collection_not_found(name: &str) -> Self {
        Self::from_kind(
            ErrorKind::CollectionNotFound,
            anyhow::anyhow!("collection '{name}' not found"),
        )
    }

    pub fn database(source: impl Into<anyhow::Error>) -> Self {
        Self::from_kind(ErrorKind::Database, source)
    }

    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::from_kind(ErrorKind::Internal, source)
    }

    pub fn not_found(message: impl fmt::Display) -> Self {
        Self::from_kind(ErrorKind::NotFound, anyhow::anyhow!("{message}"))
    }

    pub fn invalid_argument(source: impl Into<anyhow::Error>) -> Self {
        Self::from_kind(ErrorKind::InvalidArgument, source)
    }

    pub fn permission_denied(message: impl fmt::Display) -> Self {
        Self::from_kind(ErrorKind::PermissionDenied, anyhow::anyhow!("{message}"))
    }

    pub fn authentication(source: impl Into<anyhow::Error>) -> Self {
        Self::from_kind(ErrorKind::Authentication, source)
    }

    /// A fault classified by a repository component, e.g. a malformed identifier.
    pub fn repository(kind: ErrorKind, source: impl Into<anyhow::Error>) -> Self {
        Self::new(kind, Layer::Repository, source)
    }

    /// A fault classified by a request handler.
    pub fn handler(kind: ErrorKind, source: impl Into<anyhow::Error>) -> Self {
        Self::new(kind, Layer::Handler, source)
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Transport status hint from the catalog.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.kind.def().status
    }

    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }

    /// Look through the classification at the underlying error type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.source.downcast_ref::<E>()
    }

    #[must_use]
    pub fn into_cause(self) -> anyhow::Error {
        self.source
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type:{}, code:{}, message:{}",
            self.layer,
            self.kind.code(),
            self.source
        )
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("layer", &self.layer)
            .field("source", &self.source)
            .finish()
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("no documents were updated")]
    struct NoUpdate;

    #[test]
    fn display_follows_type_code_message_format() {
        let err = AppError::not_found("owner 42");
        assert_eq!(
            err.to_string(),
            "type:repository, code:NOT_FOUND, message:owner 42"
        );
    }

    #[test]
    fn explicit_layer_overrides_catalog_default() {
        let err = AppError::repository(ErrorKind::InvalidArgument, NoUpdate);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.layer(), Layer::Repository);
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn cause_is_reachable_without_reclassification() {
        let err = AppError::from_kind(ErrorKind::NotFound, NoUpdate);
        assert!(err.downcast_ref::<NoUpdate>().is_some());
        assert!(err.is(ErrorKind::NotFound));
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("no documents were updated")
        );
    }

    #[test]
    fn collection_not_found_is_an_infrastructure_fault() {
        let err = AppError::collection_not_found("eu_owners");
        assert_eq!(err.layer(), Layer::Infrastructure);
        assert_eq!(err.code(), "COLLECTION_NOT_FOUND");
        assert!(err.to_string().contains("eu_owners"));
    }
}
