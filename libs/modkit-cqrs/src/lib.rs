//! Command/query handler contracts and the decoration pipeline wrapped around them.
//!
//! Every handler is served as `validation(logging(handler))`:
//! - validation rejects malformed requests with `InvalidArgument` before anything runs, and for
//!   queries also checks the response;
//! - logging records the start and outcome of each call under the request's type name.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod decorators;
pub mod handler;
pub mod validation;

pub use decorators::{apply_command_decorators, apply_query_decorators};
pub use handler::{CommandHandler, QueryHandler};
pub use validation::{AcceptAll, ResponseValidation, StructValidator, Validator};
