// core.rs splits the ledger into hashing, chain management and validation.
pub mod chain;
pub mod hashing;
pub mod validation;

pub use chain::*;
pub use hashing::*;
pub use validation::*;
