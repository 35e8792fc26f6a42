pub mod config;
pub mod console;
pub mod dates;
pub mod engine;
pub mod ledger;
pub mod model;
pub mod observability;
pub mod wal;
