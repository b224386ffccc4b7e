// ABOUTME: Re-exports command modules for vizquery-cli
// ABOUTME: Datasource management and query commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

pub mod datasource;
pub mod query;
