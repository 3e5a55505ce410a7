mod engine;
mod ledger;
mod money;
mod operation;
mod page;
mod store;
mod user;

pub use engine::*;
pub use ledger::*;
pub use money::*;
pub use operation::*;
pub use page::*;
pub use store::*;
pub use user::*;
