use modkit_errors::{AppError, ErrorKind};
use thiserror::Error;

/// Faults reported by a store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate key for index '{index}'")]
    DuplicateKey { index: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("no document was matched, modified or upserted")]
    NoUpdate,

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(&'static str),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::CollectionNotFound(_) => ErrorKind::CollectionNotFound,
            StoreError::Unavailable(_)
            | StoreError::DuplicateKey { .. }
            | StoreError::Cancelled => ErrorKind::Database,
            StoreError::NoUpdate => ErrorKind::NotFound,
            StoreError::Token(_) => ErrorKind::InvalidArgument,
            StoreError::InvalidPipeline(_) | StoreError::Decode(_) => ErrorKind::Internal,
        };
        AppError::from_kind(kind, err)
    }
}

/// A raw document could not be turned into a storage record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' is not a {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("field '{field}': {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectIdError {
    #[error("object id must be 24 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("object id is not hexadecimal")]
    InvalidHex,
}

/// Pagination token decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid base64 in pagination token")]
    Base64,

    #[error("invalid json in pagination token")]
    Json,

    #[error("unsupported pagination token version {0}")]
    Version(u8),

    #[error("pagination token does not match the search sort")]
    SortMismatch,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use modkit_errors::Layer;

    #[test]
    fn store_faults_map_onto_the_taxonomy() {
        let cases = [
            (
                StoreError::CollectionNotFound("x".to_owned()),
                ErrorKind::CollectionNotFound,
                Layer::Infrastructure,
            ),
            (
                StoreError::Unavailable("down".to_owned()),
                ErrorKind::Database,
                Layer::Database,
            ),
            (StoreError::NoUpdate, ErrorKind::NotFound, Layer::Repository),
            (
                StoreError::Decode(DecodeError::MissingField("Title".to_owned())),
                ErrorKind::Internal,
                Layer::Internal,
            ),
        ];
        for (err, kind, layer) in cases {
            let app: AppError = err.into();
            assert_eq!(app.kind(), kind);
            assert_eq!(app.layer(), layer);
        }
    }

    #[test]
    fn cause_survives_classification() {
        let app: AppError = StoreError::NoUpdate.into();
        assert!(matches!(
            app.downcast_ref::<StoreError>(),
            Some(StoreError::NoUpdate)
        ));
    }
}
