//! Shared library for the carelog backend
//!
//! Holds the pieces every part of the service needs: the error taxonomy,
//! the day/month/year date key used by all dated tables, the semester
//! filter, configuration loading, and database initialization.

pub mod config;
pub mod datekey;
pub mod db;
pub mod error;
pub mod semester;

pub use config::Config;
pub use datekey::DateKey;
pub use error::{Error, Result};
pub use semester::SemesterFilter;
