//! Top-level test module for framesql
//!
//! This file organizes all tests into categories for parallel execution.

mod cli;
mod helpers;
mod sql_container;
mod sqlite_manager;
