// ABOUTME: Core types and constants for the VizQuery datasource platform
// ABOUTME: Foundation crate with error handling, datasource and chart models, and constants

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

#![deny(unsafe_code)]

//! # VizQuery Core
//!
//! Foundation crate providing shared types and constants for the VizQuery
//! platform. Kept free of I/O dependencies so it changes rarely and compiles
//! quickly.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Pool limits, prompt tool names, and environment variable names
//! - **models**: Datasource records, list summaries, and chart payloads

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (datasources, chart specs)
pub mod models;
