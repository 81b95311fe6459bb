//! Errors raised while binding a component to a store.

use thiserror::Error;

use crate::Capabilities;

/// Errors that can occur in [`Binding::render`](crate::Binding::render).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    #[error("'store' is not an instance of Store (missing capabilities: {missing:?})")]
    InvalidArgument { missing: Capabilities },
}
