// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Incremental decoding of a bitstream that arrives in pieces.

use std::{ffi::c_int, ptr::NonNull, sync::Arc};

use tracing::debug;
use webp_sys::LibWebp;

use crate::{DecBuffer, DecoderConfig, Error, Result, WebpCodec};

/// Outcome of feeding data to an [`IncrementalDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More data is needed.
    Suspended,
    /// The whole image has been decoded.
    Done,
}

/// Rows decoded so far in a packed RGB-family mode.
#[derive(Debug, Clone, Copy)]
pub struct RgbRows<'a> {
    /// `last_y` complete rows, `stride` bytes apart.
    pub pixels: &'a [u8],
    pub last_y: u32,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
}

/// Planes decoded so far in YUV(A) mode.
#[derive(Debug, Clone, Copy)]
pub struct YuvaRows<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    /// Empty when the image has no alpha.
    pub a: &'a [u8],
    pub last_y: u32,
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub uv_stride: usize,
    pub a_stride: usize,
}

/// Visible rectangle decoded so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedArea {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Owns a `WebPIDecoder`, deleted with `WebPIDelete` on drop.
///
/// Output memory is allocated by libwebp and lives as long as the decoder.
/// A decoder created with [`IncrementalDecoder::new_with_buffer`] or
/// [`IncrementalDecoder::with_config`] also owns the structure libwebp
/// writes the final picture into, and keeps it alive until after
/// `WebPIDelete`.
///
/// # Examples
///
/// ```no_run
/// use webp::{IncrementalDecoder, Progress};
///
/// # fn main() -> Result<(), webp::Error> {
/// # let chunks: Vec<Vec<u8>> = Vec::new();
/// let codec = webp::WebpCodec::new()?;
/// let mut decoder = IncrementalDecoder::new(&codec, webp_sys::MODE_RGBA)?;
/// for chunk in &chunks {
///     if decoder.append(chunk)? == Progress::Done {
///         break;
///     }
///     if let Some(rows) = decoder.rgb_output() {
///         println!("{} of {} rows ready", rows.last_y, rows.height);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct IncrementalDecoder {
    lib: Arc<LibWebp>,
    idec: NonNull<webp_sys::WebPIDecoder>,
    // Referenced by `idec`; dropped after it.
    target: Target,
}

/// Where libwebp puts the finished picture.
enum Target {
    Internal,
    Buffer(DecBuffer),
    Config(Box<DecoderConfig>),
}

// Safety: a WebPIDecoder may move between threads but must not be used from
// two at once, which `&mut self` on every mutating call guarantees.
unsafe impl Send for IncrementalDecoder {}

impl IncrementalDecoder {
    /// Creates a decoder producing packed output in `mode`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidData`] if `mode` is not an RGB-family mode
    /// - [`Error::DecodeFailed`] if libwebp cannot create the decoder
    pub fn new(codec: &WebpCodec, mode: webp_sys::WEBP_CSP_MODE) -> Result<Self> {
        if !webp_sys::is_rgb_mode(mode) || mode < 0 {
            return Err(Error::InvalidData);
        }
        let idec = unsafe { codec.lib.inew_rgb(mode, std::ptr::null_mut(), 0, 0) };
        Self::from_raw(codec, idec, Target::Internal)
    }

    /// Creates a decoder producing YUV planes, plus alpha when present.
    pub fn new_yuva(codec: &WebpCodec) -> Result<Self> {
        let null = std::ptr::null_mut();
        let idec = unsafe {
            codec
                .lib
                .inew_yuva(null, 0, 0, null, 0, 0, null, 0, 0, null, 0, 0)
        };
        Self::from_raw(codec, idec, Target::Internal)
    }

    /// Creates a decoder producing Y, U and V planes without alpha.
    pub fn new_yuv(codec: &WebpCodec) -> Result<Self> {
        let null = std::ptr::null_mut();
        let idec = unsafe { codec.lib.inew_yuv(null, 0, 0, null, 0, 0, null, 0, 0) };
        Self::from_raw(codec, idec, Target::Internal)
    }

    /// Creates a decoder whose finished picture lands in `buffer`, in the
    /// buffer's colorspace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeFailed`] if libwebp cannot create the decoder.
    pub fn new_with_buffer(codec: &WebpCodec, mut buffer: DecBuffer) -> Result<Self> {
        let idec = unsafe { codec.lib.inew_decoder(&mut *buffer.raw) };
        Self::from_raw(codec, idec, Target::Buffer(buffer))
    }

    /// Creates a decoder that honors the options of `config` (scaling,
    /// cropping, threading) and writes the finished picture to its output.
    ///
    /// `data` is only inspected for the bitstream features; the whole
    /// bitstream, starting with those bytes, still has to be fed through
    /// [`IncrementalDecoder::append`] or [`IncrementalDecoder::update`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidData`] for empty `data`
    /// - [`Error::DecodeFailed`] if the features cannot be parsed or the
    ///   decoder cannot be created
    pub fn with_config(codec: &WebpCodec, data: &[u8], config: DecoderConfig) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidData);
        }
        let mut config = Box::new(config);
        let idec = unsafe {
            codec
                .lib
                .idecode(data.as_ptr(), data.len(), config.as_raw_mut())
        };
        Self::from_raw(codec, idec, Target::Config(config))
    }

    fn from_raw(
        codec: &WebpCodec,
        idec: *mut webp_sys::WebPIDecoder,
        target: Target,
    ) -> Result<Self> {
        let idec = NonNull::new(idec).ok_or(Error::DecodeFailed)?;
        Ok(Self {
            lib: codec.lib.clone(),
            idec,
            target,
        })
    }

    /// The buffer passed to [`IncrementalDecoder::new_with_buffer`].
    pub fn buffer(&self) -> Option<&DecBuffer> {
        match &self.target {
            Target::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// The configuration passed to [`IncrementalDecoder::with_config`].
    pub fn config(&self) -> Option<&DecoderConfig> {
        match &self.target {
            Target::Config(config) => Some(config.as_ref()),
            _ => None,
        }
    }

    /// Feeds the next chunk of the bitstream.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidData`] for an empty chunk
    /// - [`Error::Status`] for any status other than OK or suspended
    pub fn append(&mut self, data: &[u8]) -> Result<Progress> {
        if data.is_empty() {
            return Err(Error::InvalidData);
        }
        let status = unsafe { self.lib.iappend(self.idec.as_ptr(), data.as_ptr(), data.len()) };
        progress(status)
    }

    /// Passes the whole bitstream received so far, which must extend the
    /// previously passed data.
    pub fn update(&mut self, data: &[u8]) -> Result<Progress> {
        if data.is_empty() {
            return Err(Error::InvalidData);
        }
        let status = unsafe { self.lib.iupdate(self.idec.as_ptr(), data.as_ptr(), data.len()) };
        progress(status)
    }

    /// Rows decoded so far, or `None` before the header has been parsed or
    /// when the decoder produces YUV.
    pub fn rgb_output(&self) -> Option<RgbRows<'_>> {
        let (mut last_y, mut width, mut height, mut stride): (c_int, c_int, c_int, c_int) =
            (0, 0, 0, 0);
        let ptr = unsafe {
            self.lib.idec_get_rgb(
                self.idec.as_ptr(),
                &mut last_y,
                &mut width,
                &mut height,
                &mut stride,
            )
        };
        if ptr.is_null() || last_y < 0 || stride < 0 {
            return None;
        }
        let len = stride as usize * last_y as usize;
        Some(RgbRows {
            pixels: unsafe { std::slice::from_raw_parts(ptr, len) },
            last_y: last_y as u32,
            width: width.max(0) as u32,
            height: height.max(0) as u32,
            stride: stride as usize,
        })
    }

    /// Planes decoded so far, or `None` before the header has been parsed or
    /// when the decoder produces packed output.
    pub fn yuva_output(&self) -> Option<YuvaRows<'_>> {
        let (mut u, mut v, mut a): (*mut u8, *mut u8, *mut u8) =
            (std::ptr::null_mut(), std::ptr::null_mut(), std::ptr::null_mut());
        let (mut last_y, mut width, mut height): (c_int, c_int, c_int) = (0, 0, 0);
        let (mut stride, mut uv_stride, mut a_stride): (c_int, c_int, c_int) = (0, 0, 0);
        let y = unsafe {
            self.lib.idec_get_yuva(
                self.idec.as_ptr(),
                &mut last_y,
                &mut u,
                &mut v,
                &mut a,
                &mut width,
                &mut height,
                &mut stride,
                &mut uv_stride,
                &mut a_stride,
            )
        };
        if y.is_null() || u.is_null() || v.is_null() || last_y < 0 || stride < 0 || uv_stride < 0 {
            return None;
        }
        let rows = last_y as usize;
        let uv_rows = rows.div_ceil(2);
        unsafe {
            Some(YuvaRows {
                y: std::slice::from_raw_parts(y, stride as usize * rows),
                u: std::slice::from_raw_parts(u, uv_stride as usize * uv_rows),
                v: std::slice::from_raw_parts(v, uv_stride as usize * uv_rows),
                a: if a.is_null() || a_stride <= 0 {
                    &[]
                } else {
                    std::slice::from_raw_parts(a, a_stride as usize * rows)
                },
                last_y: last_y as u32,
                width: width.max(0) as u32,
                height: height.max(0) as u32,
                stride: stride as usize,
                uv_stride: uv_stride as usize,
                a_stride: a_stride.max(0) as usize,
            })
        }
    }

    /// The visible area decoded so far.
    pub fn decoded_area(&self) -> Option<DecodedArea> {
        let (mut left, mut top, mut width, mut height): (c_int, c_int, c_int, c_int) =
            (0, 0, 0, 0);
        let buffer = unsafe {
            self.lib.idecoded_area(
                self.idec.as_ptr(),
                &mut left,
                &mut top,
                &mut width,
                &mut height,
            )
        };
        if buffer.is_null() {
            return None;
        }
        Some(DecodedArea {
            left: left.max(0) as u32,
            top: top.max(0) as u32,
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        })
    }
}

fn progress(status: webp_sys::VP8StatusCode) -> Result<Progress> {
    match status {
        webp_sys::VP8_STATUS_SUSPENDED => Ok(Progress::Suspended),
        status => Error::from_status(status).map(|()| Progress::Done),
    }
}

impl Drop for IncrementalDecoder {
    fn drop(&mut self) {
        debug!("deleting incremental decoder");
        unsafe { self.lib.idelete(self.idec.as_ptr()) };
    }
}

impl std::fmt::Debug for IncrementalDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &self.target {
            Target::Internal => "internal",
            Target::Buffer(_) => "buffer",
            Target::Config(_) => "config",
        };
        f.debug_struct("IncrementalDecoder")
            .field("idec", &self.idec)
            .field("target", &target)
            .finish_non_exhaustive()
    }
}
