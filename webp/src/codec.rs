// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! The loaded-library handle and helpers shared by decode and encode.

use std::{ffi::c_int, sync::Arc};

use webp_sys::LibWebp;

use crate::{Error, Loader, Result, loader::LibraryOpener};

/// Safe entry point to a loaded libwebp.
///
/// Cheap to clone; every clone shares the same bound library. Decode and
/// encode operations live in [`crate::decode`] and [`crate::encode`].
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), webp::Error> {
/// let codec = webp::WebpCodec::new()?;
/// let (decoder, encoder) = codec.version();
/// println!("libwebp decoder {decoder:06x}, encoder {encoder:06x}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WebpCodec {
    pub(crate) lib: Arc<LibWebp>,
}

impl WebpCodec {
    /// Loads the library through the process-wide loader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Load`] if libwebp cannot be loaded. The error is the
    /// same on every call.
    pub fn new() -> Result<Self> {
        Ok(Self::from_library(crate::ensure_loaded()?))
    }

    /// Loads the library through `loader`.
    pub fn with_loader<O: LibraryOpener>(loader: &Loader<O>) -> Result<Self> {
        Ok(Self::from_library(loader.ensure_loaded()?))
    }

    pub fn from_library(lib: Arc<LibWebp>) -> Self {
        Self { lib }
    }

    /// The bound function table, for calls the safe layer does not cover.
    pub fn library(&self) -> &Arc<LibWebp> {
        &self.lib
    }

    /// Decoder and encoder versions, packed as `0xMMmmrr`.
    pub fn version(&self) -> (u32, u32) {
        unsafe {
            (
                self.lib.get_decoder_version() as u32,
                self.lib.get_encoder_version() as u32,
            )
        }
    }

    /// Validates the bitstream header and returns the image dimensions.
    ///
    /// Returns `None` for empty or unrecognized data.
    pub fn get_info(&self, data: &[u8]) -> Option<(u32, u32)> {
        if data.is_empty() {
            return None;
        }
        let (mut width, mut height): (c_int, c_int) = (0, 0);
        let ok = unsafe {
            self.lib
                .get_info(data.as_ptr(), data.len(), &mut width, &mut height)
        };
        if ok == 0 || width <= 0 || height <= 0 {
            return None;
        }
        Some((width as u32, height as u32))
    }

    /// Parses the bitstream features.
    ///
    /// # Errors
    ///
    /// - [`Error::Status`] with `NotEnoughData` for empty input
    /// - [`Error::Status`] for any other failing status
    pub fn get_features(&self, data: &[u8]) -> Result<BitstreamFeatures> {
        if data.is_empty() {
            return Err(Error::Status(crate::StatusCode::NotEnoughData));
        }
        let mut raw = webp_sys::WebPBitstreamFeatures::default();
        let status = unsafe {
            self.lib.get_features_internal(
                data.as_ptr(),
                data.len(),
                &mut raw,
                webp_sys::WEBP_DECODER_ABI_VERSION,
            )
        };
        Error::from_status(status)?;
        Ok(BitstreamFeatures::from(&raw))
    }

    /// Whether the loaded library exports `WebPValidateDecoderConfig`.
    pub fn has_validate_decoder_config(&self) -> bool {
        self.lib.has_validate_decoder_config()
    }
}

/// Container format of a bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    UndefinedOrMixed,
    Lossy,
    Lossless,
}

/// Parsed header information of a WebP bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitstreamFeatures {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub has_animation: bool,
    pub format: Format,
}

impl From<&webp_sys::WebPBitstreamFeatures> for BitstreamFeatures {
    fn from(raw: &webp_sys::WebPBitstreamFeatures) -> Self {
        Self {
            width: raw.width.max(0) as u32,
            height: raw.height.max(0) as u32,
            has_alpha: raw.has_alpha != 0,
            has_animation: raw.has_animation != 0,
            format: match raw.format {
                webp_sys::WEBP_FORMAT_LOSSY => Format::Lossy,
                webp_sys::WEBP_FORMAT_LOSSLESS => Format::Lossless,
                _ => Format::UndefinedOrMixed,
            },
        }
    }
}

/// Memory allocated by libwebp, released with `WebPFree` on drop.
pub(crate) struct NativeAllocation<'a> {
    lib: &'a LibWebp,
    ptr: *mut u8,
}

impl<'a> NativeAllocation<'a> {
    /// Takes ownership of `ptr`. Returns `None` if it is null.
    pub(crate) fn new(lib: &'a LibWebp, ptr: *mut u8) -> Option<Self> {
        (!ptr.is_null()).then_some(Self { lib, ptr })
    }

    /// Copies the first `len` bytes out.
    ///
    /// # Safety
    ///
    /// The allocation must be at least `len` bytes long.
    pub(crate) unsafe fn to_vec(&self, len: usize) -> Vec<u8> {
        unsafe { std::slice::from_raw_parts(self.ptr, len) }.to_vec()
    }
}

impl Drop for NativeAllocation<'_> {
    fn drop(&mut self) {
        unsafe { self.lib.free(self.ptr.cast()) };
    }
}

/// Converts a dimension or stride to `c_int`, rejecting zero and overflow.
pub(crate) fn to_c_int(value: usize) -> Option<c_int> {
    c_int::try_from(value).ok().filter(|v| *v > 0)
}

/// Checks a packed pixel buffer before it is handed to an encoder.
///
/// Returns the byte length libwebp will read.
pub(crate) fn validate_pixel_input(
    pixels: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    bytes_per_pixel: usize,
) -> Result<usize> {
    if to_c_int(width).is_none() || to_c_int(height).is_none() {
        return Err(Error::InvalidDimension);
    }
    let row = width
        .checked_mul(bytes_per_pixel)
        .ok_or(Error::InvalidDimension)?;
    if stride < row || to_c_int(stride).is_none() {
        return Err(Error::InvalidStride);
    }
    let need = stride.checked_mul(height).ok_or(Error::InvalidDimension)?;
    if pixels.len() < need {
        return Err(Error::BufferTooSmall {
            got: pixels.len(),
            need,
        });
    }
    Ok(need)
}
