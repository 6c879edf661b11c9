//! fabula-admin library - catalog maintenance commands
//!
//! Offline operations against the application database: importing a legacy
//! SQLite export, seeding the starter catalog, and creating login accounts.

pub mod account;
pub mod import;
pub mod seed;
