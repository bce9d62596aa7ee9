// crates/tutor-cli/src/lib.rs
//! Command-line front end for the tutor service.
//!
//! ```rust,no_run
//! use tutor_cli::cli::run;
//!
//! # async fn example() -> anyhow::Result<()> {
//! run().await?;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod cli;
pub mod output;
pub mod service_factory;
