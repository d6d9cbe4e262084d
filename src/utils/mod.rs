// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Utility modules
//!
//! Common terminal helpers for the signer CLI.

pub mod colors;
pub mod spinner;

pub use colors::*;
pub use spinner::*;
