//! Account services layered over the stores.

pub mod accounts;
pub mod password;

pub use accounts::AccountService;
pub use password::{hash_password, verify_password};
