//! Domain / storage record mapping.

use modkit_errors::AppError;

use crate::error::DecodeError;
use crate::value::Document;

/// A typed storage record with an explicit field mapping to and from raw documents.
pub trait StorageRecord: Sized + Send + 'static {
    /// # Errors
    /// Returns [`DecodeError`] when a required field is missing or mistyped.
    fn from_document(doc: &Document) -> Result<Self, DecodeError>;

    fn to_document(&self) -> Document;
}

/// Bidirectional, validated mapping between a domain record and its storage record.
///
/// Both directions run the same validation, so `to_domain(to_database(x)?)` yields `x` for
/// every valid `x`.
pub trait Factory: Send + Sync + 'static {
    type Domain: Send + Sync + 'static;
    type Record: StorageRecord;

    /// # Errors
    /// Returns an [`AppError`] when the record fails validation or identifier mapping.
    fn to_domain(&self, record: Self::Record) -> Result<Self::Domain, AppError>;

    /// # Errors
    /// Returns an [`AppError`] when the domain record fails validation or identifier mapping.
    fn to_database(&self, domain: &Self::Domain) -> Result<Self::Record, AppError>;
}

/// Turns raw documents into domain records. Blanket-implemented for every [`Factory`].
pub trait RecordDecoder<T>: Send + Sync {
    /// # Errors
    /// Decode and mapping failures are classified as internal errors.
    fn decode(&self, doc: &Document) -> Result<T, AppError>;
}

impl<F: Factory> RecordDecoder<F::Domain> for F {
    fn decode(&self, doc: &Document) -> Result<F::Domain, AppError> {
        let record = F::Record::from_document(doc).map_err(AppError::internal)?;
        self.to_domain(record)
    }
}

/// Encode a domain record into a raw document.
///
/// # Errors
/// Propagates [`Factory::to_database`] failures.
pub fn encode<F: Factory>(factory: &F, domain: &F::Domain) -> Result<Document, AppError> {
    Ok(factory.to_database(domain)?.to_document())
}
