// ABOUTME: Output formatting helpers for vizquery-cli
// ABOUTME: Prints command results as pretty JSON on stdout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

use serde::Serialize;
use vizquery::errors::{AppError, AppResult};

/// Print `value` as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}
