// ABOUTME: Re-exports helper modules for vizquery-cli
// ABOUTME: Provides output formatting utilities
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VizQuery Contributors

pub mod display;
