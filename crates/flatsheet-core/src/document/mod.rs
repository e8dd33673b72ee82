//! A named sheet instance and the operations it supports.

mod io;
mod ops;
mod query;
mod state;

pub use state::{Sheet, validate_instance_name};
