// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! # webp-sys: Raw FFI bindings to libwebp
//!
//! This crate provides low-level, unsafe Rust bindings to libwebp. The
//! function bindings are generated at build time by `webp-bindgen` from
//! `spec.json`; the structure layouts in [`abi`] are written by hand to match
//! libwebp's headers for the targeted ABI version.
//!
//! ## Overview
//!
//! `webp-sys` exposes:
//! - [`LibWebp`]: one typed function pointer per libwebp entry point, resolved
//!   from a dynamically loaded library by [`LibWebp::load`]
//! - Raw C structures (`WebPDecoderConfig`, `WebPConfig`, `WebPPicture`, etc.)
//! - Constants for status codes, colorspaces, presets and ABI versions
//! - [`NativeLibrary`]: the seam through which symbols are resolved
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe [`webp`]
//! wrapper crate instead, which locates and loads the library once per
//! process and converts status codes into errors.
//!
//! ## Safety
//!
//! Every binding is `unsafe` and requires the caller to uphold libwebp's
//! invariants:
//! - Structures passed by pointer must stay valid and unmoved for the call
//! - Memory returned by libwebp must be released with the matching libwebp
//!   call (`free`, `free_dec_buffer`, `memory_writer_clear`, ...)
//! - `*_internal` initializers must receive the ABI version constants
//!
//! ## Optional entry points
//!
//! Entry points marked optional in `spec.json` (currently only
//! `WebPValidateDecoderConfig`, added in libwebp 1.6.0) may be missing. Their
//! methods return `None` in that case and `has_*` reports their presence.
//!
//! [`webp`]: https://docs.rs/webp

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

pub mod abi;
mod symbols;

pub use abi::*;
pub use symbols::{BindingInfo, NativeLibrary, SymbolError};

#[allow(unused_imports)]
use core::ffi::{c_float, c_int, c_void};

// Include webp-bindgen generated bindings
include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
