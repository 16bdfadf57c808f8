//! Error catalog: one static definition per [`ErrorKind`].

use serde::Serialize;

use crate::app_error::Layer;

/// Static error definition from the catalog.
///
/// `status` is a transport hint for boundary collaborators; the core never formats responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub layer: Layer,
}

/// Classification of a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The target collection does not exist in the store.
    CollectionNotFound,
    /// Driver or transport failure talking to the store.
    Database,
    /// Decode, mapping or post-validation failure.
    Internal,
    /// Zero documents matched a lookup, update or delete.
    NotFound,
    /// Request rejected before execution.
    InvalidArgument,
    PermissionDenied,
    Authentication,
}

const COLLECTION_NOT_FOUND: ErrDef = ErrDef {
    status: 500,
    title: "Collection Not Found",
    code: "COLLECTION_NOT_FOUND",
    layer: Layer::Infrastructure,
};

const DATABASE: ErrDef = ErrDef {
    status: 503,
    title: "Database Error",
    code: "DATABASE_ERROR",
    layer: Layer::Database,
};

const INTERNAL: ErrDef = ErrDef {
    status: 500,
    title: "Internal Error",
    code: "INTERNAL",
    layer: Layer::Internal,
};

const NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    title: "Not Found",
    code: "NOT_FOUND",
    layer: Layer::Repository,
};

const INVALID_ARGUMENT: ErrDef = ErrDef {
    status: 400,
    title: "Invalid Argument",
    code: "INVALID_ARGUMENT",
    layer: Layer::InvalidArgument,
};

const PERMISSION_DENIED: ErrDef = ErrDef {
    status: 403,
    title: "Permission Denied",
    code: "PERMISSION_DENIED",
    layer: Layer::Handler,
};

const AUTHENTICATION: ErrDef = ErrDef {
    status: 401,
    title: "Unauthenticated",
    code: "UNAUTHENTICATED",
    layer: Layer::Authentication,
};

impl ErrorKind {
    /// Catalog entry for this kind.
    #[must_use]
    pub const fn def(self) -> &'static ErrDef {
        match self {
            Self::CollectionNotFound => &COLLECTION_NOT_FOUND,
            Self::Database => &DATABASE,
            Self::Internal => &INTERNAL,
            Self::NotFound => &NOT_FOUND,
            Self::InvalidArgument => &INVALID_ARGUMENT,
            Self::PermissionDenied => &PERMISSION_DENIED,
            Self::Authentication => &AUTHENTICATION,
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        self.def().code
    }

    #[must_use]
    pub const fn default_layer(self) -> Layer {
        self.def().layer
    }
}
