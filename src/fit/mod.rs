//! External Rasch fitting service interface.

mod service;

pub use service::*;
