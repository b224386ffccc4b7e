// ABOUTME: Re-exports domain-organized constants from vizquery-core
// ABOUTME: Pool limits, vault parameters, tool names, and environment variable names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

pub use vizquery_core::constants::{env_config, gateway, service_names, tables, tools, vault};
