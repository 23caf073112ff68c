//! Persistence module split across logical submodules. Each submodule adds an
//! `impl Store` block for one table.

mod albums;
mod bands;
mod connection;
mod members;
mod memberships;

pub use connection::{data_dir, default_db_path, default_log_path, Store};
