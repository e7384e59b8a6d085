//! SeaORM entities
//!
//! Column and table names are normative: collaborating subsystems join
//! against them. The user tables are owned by the user subsystem and are
//! read-only here.

pub mod file;
pub mod file_closure;
pub mod file_share;
pub mod user;
pub mod user_closure;
