// ABOUTME: Cryptography module providing credential encryption for stored datasources
// ABOUTME: Centralizes the vault key derivation and the token format used at rest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

//! Cryptographic utilities for VizQuery

pub mod vault;

pub use vault::{shared_vault, CredentialVault};
