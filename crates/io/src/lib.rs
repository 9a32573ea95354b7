// File I/O operations

pub mod atomic;
pub mod csv;
pub mod error;
pub mod json;

pub use error::PersistError;
