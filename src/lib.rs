//! # Task Manager
//!
//! A CRUD task-management HTTP service built with Axum, SQLx, and Tokio.
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod ports;
