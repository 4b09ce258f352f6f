//! Errors raised by the server loops.

use crate::store::ports::StoreError;
use thiserror::Error;

/// Errors that abort one scheduler or monitor tick.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A listing the whole tick depends on failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
