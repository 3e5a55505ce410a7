// Application layer - use cases and orchestration over the ledger engine and the store.

pub mod error;
mod operations;
mod password;
mod service;
mod users;
mod validation;

pub use error::*;
pub use operations::*;
pub use password::*;
pub use service::*;
pub use users::*;
pub use validation::*;
