//! CLI tests module

#[cfg(feature = "cli")]
pub mod binary_tests;
#[cfg(feature = "cli")]
pub mod init_tests;
#[cfg(all(feature = "cli", feature = "duckdb-backend"))]
pub mod run_tests;
