// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Structure layouts and constants mirroring libwebp's `decode.h`,
//! `encode.h` and `types.h`.
//!
//! Field order, widths and the headers' explicit `pad` arrays are reproduced
//! one-for-one; `#[repr(C)]` supplies the alignment padding a C compiler
//! inserts. libwebp writes through pointers to these structures, so any
//! mismatch corrupts memory silently instead of failing loudly. The layout
//! tests at the bottom of this file pin sizes and offsets for 64-bit targets.

use core::ffi::{c_float, c_int, c_void};
use core::mem::size_of;

/// ABI version passed to every decoder `*Internal` initializer.
pub const WEBP_DECODER_ABI_VERSION: c_int = 0x0210;
/// ABI version passed to every encoder `*Internal` initializer.
pub const WEBP_ENCODER_ABI_VERSION: c_int = 0x0210;

/// Status returned by decode entry points.
pub type VP8StatusCode = c_int;
pub const VP8_STATUS_OK: VP8StatusCode = 0;
pub const VP8_STATUS_OUT_OF_MEMORY: VP8StatusCode = 1;
pub const VP8_STATUS_INVALID_PARAM: VP8StatusCode = 2;
pub const VP8_STATUS_BITSTREAM_ERROR: VP8StatusCode = 3;
pub const VP8_STATUS_UNSUPPORTED_FEATURE: VP8StatusCode = 4;
pub const VP8_STATUS_SUSPENDED: VP8StatusCode = 5;
pub const VP8_STATUS_USER_ABORT: VP8StatusCode = 6;
pub const VP8_STATUS_NOT_ENOUGH_DATA: VP8StatusCode = 7;

/// Decoder output colorspace.
pub type WEBP_CSP_MODE = c_int;
pub const MODE_RGB: WEBP_CSP_MODE = 0;
pub const MODE_RGBA: WEBP_CSP_MODE = 1;
pub const MODE_BGR: WEBP_CSP_MODE = 2;
pub const MODE_BGRA: WEBP_CSP_MODE = 3;
pub const MODE_ARGB: WEBP_CSP_MODE = 4;
pub const MODE_RGBA_4444: WEBP_CSP_MODE = 5;
pub const MODE_RGB_565: WEBP_CSP_MODE = 6;
pub const MODE_rgbA: WEBP_CSP_MODE = 7;
pub const MODE_bgrA: WEBP_CSP_MODE = 8;
pub const MODE_Argb: WEBP_CSP_MODE = 9;
pub const MODE_rgbA_4444: WEBP_CSP_MODE = 10;
pub const MODE_YUV: WEBP_CSP_MODE = 11;
pub const MODE_YUVA: WEBP_CSP_MODE = 12;
pub const MODE_LAST: WEBP_CSP_MODE = 13;

/// Whether `mode` carries premultiplied alpha.
pub const fn is_premultiplied_mode(mode: WEBP_CSP_MODE) -> bool {
    matches!(mode, MODE_rgbA | MODE_bgrA | MODE_Argb | MODE_rgbA_4444)
}

/// Whether `mode` carries an alpha channel.
pub const fn is_alpha_mode(mode: WEBP_CSP_MODE) -> bool {
    matches!(
        mode,
        MODE_RGBA | MODE_BGRA | MODE_ARGB | MODE_RGBA_4444 | MODE_YUVA
    ) || is_premultiplied_mode(mode)
}

/// Whether `mode` is a packed RGB-family mode (as opposed to planar YUV).
pub const fn is_rgb_mode(mode: WEBP_CSP_MODE) -> bool {
    mode < MODE_YUV
}

/// Bitstream format reported in [`WebPBitstreamFeatures::format`].
pub const WEBP_FORMAT_UNDEFINED_OR_MIXED: c_int = 0;
pub const WEBP_FORMAT_LOSSY: c_int = 1;
pub const WEBP_FORMAT_LOSSLESS: c_int = 2;

/// Encoder presets accepted by `WebPConfigInitInternal`.
pub type WebPPreset = c_int;
pub const WEBP_PRESET_DEFAULT: WebPPreset = 0;
pub const WEBP_PRESET_PICTURE: WebPPreset = 1;
pub const WEBP_PRESET_PHOTO: WebPPreset = 2;
pub const WEBP_PRESET_DRAWING: WebPPreset = 3;
pub const WEBP_PRESET_ICON: WebPPreset = 4;
pub const WEBP_PRESET_TEXT: WebPPreset = 5;

pub type WebPImageHint = c_int;
pub const WEBP_HINT_DEFAULT: WebPImageHint = 0;
pub const WEBP_HINT_PICTURE: WebPImageHint = 1;
pub const WEBP_HINT_PHOTO: WebPImageHint = 2;
pub const WEBP_HINT_GRAPH: WebPImageHint = 3;
pub const WEBP_HINT_LAST: WebPImageHint = 4;

/// Encoder colorspace of a [`WebPPicture`] in YUV mode.
pub type WebPEncCSP = c_int;
pub const WEBP_YUV420: WebPEncCSP = 0;
pub const WEBP_YUV420A: WebPEncCSP = 4;

/// Reason stored in [`WebPPicture::error_code`] when encoding fails.
pub type WebPEncodingError = c_int;
pub const VP8_ENC_OK: WebPEncodingError = 0;
pub const VP8_ENC_ERROR_OUT_OF_MEMORY: WebPEncodingError = 1;
pub const VP8_ENC_ERROR_BITSTREAM_OUT_OF_MEMORY: WebPEncodingError = 2;
pub const VP8_ENC_ERROR_NULL_PARAMETER: WebPEncodingError = 3;
pub const VP8_ENC_ERROR_INVALID_CONFIGURATION: WebPEncodingError = 4;
pub const VP8_ENC_ERROR_BAD_DIMENSION: WebPEncodingError = 5;
pub const VP8_ENC_ERROR_PARTITION0_OVERFLOW: WebPEncodingError = 6;
pub const VP8_ENC_ERROR_PARTITION_OVERFLOW: WebPEncodingError = 7;
pub const VP8_ENC_ERROR_BAD_WRITE: WebPEncodingError = 8;
pub const VP8_ENC_ERROR_FILE_TOO_BIG: WebPEncodingError = 9;
pub const VP8_ENC_ERROR_USER_ABORT: WebPEncodingError = 10;
pub const VP8_ENC_ERROR_LAST: WebPEncodingError = 11;

/// `WebPWriterFunction`: receives encoded bytes, returns 0 to abort.
pub type WebPWriterFunction = Option<
    unsafe extern "C" fn(data: *const u8, data_size: usize, picture: *const WebPPicture) -> c_int,
>;

/// `WebPProgressHook`: receives a percentage, returns 0 to abort.
pub type WebPProgressHook =
    Option<unsafe extern "C" fn(percent: c_int, picture: *const WebPPicture) -> c_int>;

/// Opaque incremental decoder handle.
#[repr(C)]
pub struct WebPIDecoder {
    _private: [u8; 0],
}

/// Opaque encoder statistics. Only ever handled by pointer.
#[repr(C)]
pub struct WebPAuxStats {
    _private: [u8; 0],
}

/// Implements `Default` as all-zero bytes, which is the state libwebp's
/// initializers expect and a valid value for every field type used here.
macro_rules! zeroed_default {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Default for $ty {
                fn default() -> Self {
                    let mut s = ::core::mem::MaybeUninit::<Self>::uninit();
                    unsafe {
                        ::core::ptr::write_bytes(s.as_mut_ptr(), 0, 1);
                        s.assume_init()
                    }
                }
            }
        )*
    };
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPBitstreamFeatures {
    pub width: c_int,
    pub height: c_int,
    pub has_alpha: c_int,
    pub has_animation: c_int,
    /// One of the `WEBP_FORMAT_*` constants.
    pub format: c_int,
    pub pad: [u32; 5],
}

/// Packed RGB-family output view of a [`WebPDecBuffer`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WebPRGBABuffer {
    pub rgba: *mut u8,
    pub stride: c_int,
    pub size: usize,
}

/// Planar YUV(A) output view of a [`WebPDecBuffer`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WebPYUVABuffer {
    pub y: *mut u8,
    pub u: *mut u8,
    pub v: *mut u8,
    pub a: *mut u8,
    pub y_stride: c_int,
    pub u_stride: c_int,
    pub v_stride: c_int,
    pub a_stride: c_int,
    pub y_size: usize,
    pub u_size: usize,
    pub v_size: usize,
    pub a_size: usize,
}

const fn max(a: usize, b: usize) -> usize {
    if a > b { a } else { b }
}

pub const DEC_BUFFER_UNION_SIZE: usize =
    max(size_of::<WebPRGBABuffer>(), size_of::<WebPYUVABuffer>());

/// Storage of the `u` union in `WebPDecBuffer`.
///
/// Kept as raw bytes; the active variant depends on the buffer's colorspace
/// and is only reachable through [`WebPDecBuffer::output`] and
/// [`WebPDecBuffer::set_output`].
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DecBufferUnion {
    _align: [usize; 0],
    bytes: [u8; DEC_BUFFER_UNION_SIZE],
}

impl core::fmt::Debug for DecBufferUnion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecBufferUnion").finish_non_exhaustive()
    }
}

/// The active variant of a decode buffer's output union.
#[derive(Debug, Clone, Copy)]
pub enum DecOutput {
    Rgba(WebPRGBABuffer),
    Yuva(WebPYUVABuffer),
}

/// The colorspace tag and the output variant passed to
/// [`WebPDecBuffer::set_output`] disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("colorspace {colorspace} does not select the {variant} output")]
pub struct OutputModeMismatch {
    pub colorspace: WEBP_CSP_MODE,
    pub variant: &'static str,
}

/// Decoder output buffer (`WebPDecBuffer`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WebPDecBuffer {
    pub colorspace: WEBP_CSP_MODE,
    pub width: c_int,
    pub height: c_int,
    /// Non-zero when the output memory belongs to the caller, not libwebp.
    pub is_external_memory: c_int,
    u: DecBufferUnion,
    pub pad: [u32; 4],
    pub private_memory: *mut u8,
}

impl WebPDecBuffer {
    /// Reads the output variant selected by `colorspace`.
    pub fn output(&self) -> DecOutput {
        let src = self.u.bytes.as_ptr();
        // Both variants fit in the union storage and are plain old data.
        unsafe {
            if is_rgb_mode(self.colorspace) {
                DecOutput::Rgba(core::ptr::read_unaligned(src.cast::<WebPRGBABuffer>()))
            } else {
                DecOutput::Yuva(core::ptr::read_unaligned(src.cast::<WebPYUVABuffer>()))
            }
        }
    }

    /// The packed output, if the colorspace is an RGB-family mode.
    pub fn rgba(&self) -> Option<WebPRGBABuffer> {
        match self.output() {
            DecOutput::Rgba(rgba) => Some(rgba),
            DecOutput::Yuva(_) => None,
        }
    }

    /// The planar output, if the colorspace is a YUV mode.
    pub fn yuva(&self) -> Option<WebPYUVABuffer> {
        match self.output() {
            DecOutput::Yuva(yuva) => Some(yuva),
            DecOutput::Rgba(_) => None,
        }
    }

    /// Sets the colorspace and writes the matching output variant.
    ///
    /// The remaining union bytes are zeroed so a later read of the other
    /// variant never observes stale pointers. A mismatched variant leaves
    /// the buffer untouched.
    pub fn set_output(
        &mut self,
        colorspace: WEBP_CSP_MODE,
        output: DecOutput,
    ) -> Result<(), OutputModeMismatch> {
        let rgb = is_rgb_mode(colorspace);
        match output {
            DecOutput::Rgba(_) if !rgb => {
                return Err(OutputModeMismatch {
                    colorspace,
                    variant: "RGBA",
                });
            }
            DecOutput::Yuva(_) if rgb => {
                return Err(OutputModeMismatch {
                    colorspace,
                    variant: "YUVA",
                });
            }
            _ => {}
        }

        self.u.bytes = [0; DEC_BUFFER_UNION_SIZE];
        let dst = self.u.bytes.as_mut_ptr();
        match output {
            DecOutput::Rgba(rgba) => unsafe {
                core::ptr::write_unaligned(dst.cast::<WebPRGBABuffer>(), rgba)
            },
            DecOutput::Yuva(yuva) => unsafe {
                core::ptr::write_unaligned(dst.cast::<WebPYUVABuffer>(), yuva)
            },
        }
        self.colorspace = colorspace;
        Ok(())
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPDecoderOptions {
    pub bypass_filtering: c_int,
    pub no_fancy_upsampling: c_int,
    pub use_cropping: c_int,
    pub crop_left: c_int,
    pub crop_top: c_int,
    pub crop_width: c_int,
    pub crop_height: c_int,
    pub use_scaling: c_int,
    pub scaled_width: c_int,
    pub scaled_height: c_int,
    pub use_threads: c_int,
    pub dithering_strength: c_int,
    pub flip: c_int,
    pub alpha_dithering_strength: c_int,
    pub pad: [u32; 5],
}

/// Advanced decoding parameters (`WebPDecoderConfig`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPDecoderConfig {
    pub input: WebPBitstreamFeatures,
    pub output: WebPDecBuffer,
    pub options: WebPDecoderOptions,
}

/// Encoder parameters (`WebPConfig`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WebPConfig {
    pub lossless: c_int,
    pub quality: c_float,
    pub method: c_int,
    pub image_hint: WebPImageHint,
    pub target_size: c_int,
    pub target_PSNR: c_float,
    pub segments: c_int,
    pub sns_strength: c_int,
    pub filter_strength: c_int,
    pub filter_sharpness: c_int,
    pub filter_type: c_int,
    pub autofilter: c_int,
    pub alpha_compression: c_int,
    pub alpha_filtering: c_int,
    pub alpha_quality: c_int,
    pub pass: c_int,
    pub show_compressed: c_int,
    pub preprocessing: c_int,
    pub partitions: c_int,
    pub partition_limit: c_int,
    pub emulate_jpeg_size: c_int,
    pub thread_level: c_int,
    pub low_memory: c_int,
    pub near_lossless: c_int,
    pub exact: c_int,
    pub use_delta_palette: c_int,
    pub use_sharp_yuv: c_int,
    pub qmin: c_int,
    pub qmax: c_int,
}

/// Growable in-memory sink for [`WebPPicture::writer`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WebPMemoryWriter {
    pub mem: *mut u8,
    pub size: usize,
    pub max_size: usize,
    pub pad: [u32; 1],
}

/// Encoder input picture (`WebPPicture`).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WebPPicture {
    pub use_argb: c_int,

    pub colorspace: WebPEncCSP,
    pub width: c_int,
    pub height: c_int,
    pub y: *mut u8,
    pub u: *mut u8,
    pub v: *mut u8,
    pub y_stride: c_int,
    pub uv_stride: c_int,
    pub a: *mut u8,
    pub a_stride: c_int,
    pub pad1: [u32; 2],

    pub argb: *mut u32,
    pub argb_stride: c_int,
    pub pad2: [u32; 3],

    pub writer: WebPWriterFunction,
    pub custom_ptr: *mut c_void,

    pub extra_info_type: c_int,
    pub extra_info: *mut u8,

    pub stats: *mut WebPAuxStats,

    pub error_code: WebPEncodingError,

    pub progress_hook: WebPProgressHook,
    pub user_data: *mut c_void,

    pub pad3: [u32; 3],
    pub pad4: *mut u8,
    pub pad5: *mut u8,
    pub pad6: [u32; 8],

    pub memory_: *mut c_void,
    pub memory_argb_: *mut c_void,
    pub pad7: [*mut c_void; 2],
}

zeroed_default!(
    WebPRGBABuffer,
    WebPYUVABuffer,
    DecBufferUnion,
    WebPDecBuffer,
    WebPMemoryWriter,
    WebPPicture,
);
