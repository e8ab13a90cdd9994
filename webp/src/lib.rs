// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! # webp: runtime-loaded libwebp
//!
//! Locates libwebp at runtime, binds its entry points once per process and
//! wraps the common calls with buffer validation, typed errors and RAII
//! release of native memory.
//!
//! ## Overview
//!
//! - [`Loader`]: tries the compiled-in candidate names
//!   ([`config::candidate_library_names`]), binds every symbol of
//!   [`webp_sys::LibWebp`] and memoizes the outcome. [`global_loader`] is the
//!   process-wide instance; tests and embedders can build their own with a
//!   custom [`LibraryOpener`].
//! - [`WebpCodec`]: the safe layer. Simple decode and encode, the advanced
//!   decoder ([`DecoderConfig`]) and encoder ([`EncoderConfig`]), and
//!   [`IncrementalDecoder`].
//!
//! A missing library is not fatal: [`available`] reports it and every
//! operation returns [`Error::Load`] with the list of names that were tried.
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), webp::Error> {
//! if !webp::available() {
//!     return Ok(());
//! }
//! let codec = webp::WebpCodec::new()?;
//! let pixels = vec![255u8; 16 * 16 * 4];
//! let encoded = codec.encode_lossless_rgba(&pixels, 16, 16, 16 * 4)?;
//! let decoded = codec.decode_rgba(&encoded)?;
//! assert_eq!((decoded.width, decoded.height), (16, 16));
//! # Ok(())
//! # }
//! ```
//!
//! ## Optional entry points
//!
//! `WebPValidateDecoderConfig` appeared in libwebp 1.6.0. Older libraries
//! still load; [`WebpCodec::validate_decoder_config`] then returns
//! [`Error::Unavailable`] and `capability("validate_decoder_config")` is
//! `false`.

mod codec;
mod decode;
mod encode;
mod error;
mod incremental;
mod loader;

pub mod config;

use std::sync::{Arc, OnceLock};

pub use codec::{BitstreamFeatures, Format, WebpCodec};
pub use decode::{DecBuffer, DecodedImage, DecoderConfig, PixelLayout, YuvImage, YuvPlanesMut};
pub use encode::{EncodeLayout, EncoderConfig, Preset};
pub use error::{Error, Result, StatusCode};
pub use incremental::{DecodedArea, IncrementalDecoder, Progress, RgbRows, YuvaRows};
pub use loader::{LibraryOpener, LoadError, LoadState, Loader, SystemOpener};
pub use webp_sys::LibWebp;

/// The process-wide loader, using [`SystemOpener`].
pub fn global_loader() -> &'static Loader<SystemOpener> {
    static GLOBAL: OnceLock<Loader<SystemOpener>> = OnceLock::new();
    GLOBAL.get_or_init(|| Loader::new(SystemOpener))
}

/// Loads libwebp through [`global_loader`].
///
/// # Errors
///
/// Returns the same [`LoadError`] on every call once loading has failed.
pub fn ensure_loaded() -> core::result::Result<Arc<LibWebp>, LoadError> {
    global_loader().ensure_loaded()
}

/// Whether libwebp can be loaded in this process.
pub fn available() -> bool {
    global_loader().available()
}
