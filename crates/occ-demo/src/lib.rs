//! Optimistic concurrency demo.
//!
//! Several workers increment the same counter in a remote key-value store:
//!
//! - **Unsafe mode**: read, add one, write back unconditionally. Concurrent writers
//!   overwrite each other and updates are lost.
//! - **Safe mode**: read, add one, write back only if the stored counter still equals
//!   the value that was read. Stale writes are rejected and retried, so every commit
//!   is reflected in the final value.
//!
//! The crate provides the updater (one attempt), the driver (worker fan-out and
//! join), the loader (table seeding), and the final report.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod demo;
pub mod driver;
pub mod error;
pub mod loader;
pub mod report;
pub mod updater;

pub use cli::Cli;
pub use demo::run_demo;
pub use driver::Driver;
pub use error::{DemoError, DriverError, LoadError, UpdateError};
pub use loader::Loader;
pub use report::FinalReport;
pub use updater::{Outcome, Updater};
