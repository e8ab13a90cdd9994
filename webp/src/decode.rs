// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Simple and advanced decoding.
//!
//! The simple entry points either copy libwebp's output into a [`Vec`] and
//! release the native buffer right away, or decode straight into a caller
//! buffer after checking that it is large enough. [`DecoderConfig`] wraps the
//! advanced API.

use std::{ffi::c_int, sync::Arc};

use webp_sys::LibWebp;

use crate::{
    BitstreamFeatures, Error, Result, WebpCodec,
    codec::{NativeAllocation, to_c_int},
};

/// Packed output layout of the simple decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba,
    Argb,
    Bgra,
    Rgb,
    Bgr,
}

impl PixelLayout {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgba | PixelLayout::Argb | PixelLayout::Bgra => 4,
            PixelLayout::Rgb | PixelLayout::Bgr => 3,
        }
    }

    /// The matching decoder colorspace.
    pub const fn mode(self) -> webp_sys::WEBP_CSP_MODE {
        match self {
            PixelLayout::Rgba => webp_sys::MODE_RGBA,
            PixelLayout::Argb => webp_sys::MODE_ARGB,
            PixelLayout::Bgra => webp_sys::MODE_BGRA,
            PixelLayout::Rgb => webp_sys::MODE_RGB,
            PixelLayout::Bgr => webp_sys::MODE_BGR,
        }
    }
}

/// A decoded image in a packed layout, owned by Rust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row; always `width * layout.bytes_per_pixel()`.
    pub stride: usize,
    pub layout: PixelLayout,
}

/// A decoded image in planar YUV 4:2:0, owned by Rust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YuvImage {
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub y_stride: usize,
    pub uv_stride: usize,
}

/// Caller-owned destination planes for [`WebpCodec::decode_yuv_into`].
#[derive(Debug)]
pub struct YuvPlanesMut<'a> {
    pub y: &'a mut [u8],
    pub y_stride: usize,
    pub u: &'a mut [u8],
    pub u_stride: usize,
    pub v: &'a mut [u8],
    pub v_stride: usize,
}

type DecodeFn = unsafe fn(&LibWebp, *const u8, usize, *mut c_int, *mut c_int) -> *mut u8;
type DecodeIntoFn = unsafe fn(&LibWebp, *const u8, usize, *mut u8, usize, c_int) -> *mut u8;

fn decode_fn(layout: PixelLayout) -> DecodeFn {
    match layout {
        PixelLayout::Rgba => LibWebp::decode_rgba,
        PixelLayout::Argb => LibWebp::decode_argb,
        PixelLayout::Bgra => LibWebp::decode_bgra,
        PixelLayout::Rgb => LibWebp::decode_rgb,
        PixelLayout::Bgr => LibWebp::decode_bgr,
    }
}

fn decode_into_fn(layout: PixelLayout) -> DecodeIntoFn {
    match layout {
        PixelLayout::Rgba => LibWebp::decode_rgba_into,
        PixelLayout::Argb => LibWebp::decode_argb_into,
        PixelLayout::Bgra => LibWebp::decode_bgra_into,
        PixelLayout::Rgb => LibWebp::decode_rgb_into,
        PixelLayout::Bgr => LibWebp::decode_bgr_into,
    }
}

impl WebpCodec {
    /// Decodes `data` into packed RGBA.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidData`] for empty input
    /// - [`Error::DecodeFailed`] if libwebp rejects the bitstream
    /// - [`Error::InvalidDimension`] if libwebp reports a non-positive size
    pub fn decode_rgba(&self, data: &[u8]) -> Result<DecodedImage> {
        self.decode(data, PixelLayout::Rgba)
    }

    /// Decodes `data` into packed ARGB.
    pub fn decode_argb(&self, data: &[u8]) -> Result<DecodedImage> {
        self.decode(data, PixelLayout::Argb)
    }

    /// Decodes `data` into packed BGRA.
    pub fn decode_bgra(&self, data: &[u8]) -> Result<DecodedImage> {
        self.decode(data, PixelLayout::Bgra)
    }

    /// Decodes `data` into packed RGB.
    pub fn decode_rgb(&self, data: &[u8]) -> Result<DecodedImage> {
        self.decode(data, PixelLayout::Rgb)
    }

    /// Decodes `data` into packed BGR.
    pub fn decode_bgr(&self, data: &[u8]) -> Result<DecodedImage> {
        self.decode(data, PixelLayout::Bgr)
    }

    /// Decodes `data` into a packed layout and copies the result out.
    ///
    /// The native buffer is released with `WebPFree` before returning, on
    /// the error paths too.
    pub fn decode(&self, data: &[u8], layout: PixelLayout) -> Result<DecodedImage> {
        if data.is_empty() {
            return Err(Error::InvalidData);
        }
        let (mut width, mut height): (c_int, c_int) = (0, 0);
        let ptr = unsafe {
            decode_fn(layout)(
                &*self.lib,
                data.as_ptr(),
                data.len(),
                &mut width,
                &mut height,
            )
        };
        let output = NativeAllocation::new(&self.lib, ptr).ok_or(Error::DecodeFailed)?;
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidDimension);
        }

        let stride = width as usize * layout.bytes_per_pixel();
        // libwebp allocates exactly `stride * height` bytes for packed output.
        let pixels = unsafe { output.to_vec(stride * height as usize) };
        Ok(DecodedImage {
            pixels,
            width: width as u32,
            height: height as u32,
            stride,
            layout,
        })
    }

    /// Decodes `data` as RGBA into `output`, whose rows are `stride` bytes
    /// apart.
    ///
    /// Returns the image dimensions.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidData`] if `data` is empty or not a WebP bitstream
    /// - [`Error::InvalidStride`] if a row does not fit in `stride`
    /// - [`Error::BufferTooSmall`] if `output` is shorter than
    ///   `stride * height`
    /// - [`Error::DecodeFailed`] if libwebp fails to decode
    pub fn decode_rgba_into(
        &self,
        data: &[u8],
        output: &mut [u8],
        stride: usize,
    ) -> Result<(u32, u32)> {
        self.decode_into(data, PixelLayout::Rgba, output, stride)
    }

    pub fn decode_argb_into(
        &self,
        data: &[u8],
        output: &mut [u8],
        stride: usize,
    ) -> Result<(u32, u32)> {
        self.decode_into(data, PixelLayout::Argb, output, stride)
    }

    pub fn decode_bgra_into(
        &self,
        data: &[u8],
        output: &mut [u8],
        stride: usize,
    ) -> Result<(u32, u32)> {
        self.decode_into(data, PixelLayout::Bgra, output, stride)
    }

    pub fn decode_rgb_into(
        &self,
        data: &[u8],
        output: &mut [u8],
        stride: usize,
    ) -> Result<(u32, u32)> {
        self.decode_into(data, PixelLayout::Rgb, output, stride)
    }

    pub fn decode_bgr_into(
        &self,
        data: &[u8],
        output: &mut [u8],
        stride: usize,
    ) -> Result<(u32, u32)> {
        self.decode_into(data, PixelLayout::Bgr, output, stride)
    }

    /// Decodes into a caller buffer in the given layout.
    pub fn decode_into(
        &self,
        data: &[u8],
        layout: PixelLayout,
        output: &mut [u8],
        stride: usize,
    ) -> Result<(u32, u32)> {
        if data.is_empty() {
            return Err(Error::InvalidData);
        }
        let (width, height) = self.get_info(data).ok_or(Error::InvalidData)?;
        if stride < width as usize * layout.bytes_per_pixel() {
            return Err(Error::InvalidStride);
        }
        let c_stride = to_c_int(stride).ok_or(Error::InvalidStride)?;
        check_len(output.len(), stride, height as usize)?;

        let ptr = unsafe {
            decode_into_fn(layout)(
                &*self.lib,
                data.as_ptr(),
                data.len(),
                output.as_mut_ptr(),
                output.len(),
                c_stride,
            )
        };
        if ptr.is_null() {
            return Err(Error::DecodeFailed);
        }
        Ok((width, height))
    }

    /// Decodes `data` into planar YUV 4:2:0 and copies the planes out.
    ///
    /// # Errors
    ///
    /// Same as [`WebpCodec::decode`].
    pub fn decode_yuv(&self, data: &[u8]) -> Result<YuvImage> {
        if data.is_empty() {
            return Err(Error::InvalidData);
        }
        let (mut width, mut height): (c_int, c_int) = (0, 0);
        let (mut u, mut v): (*mut u8, *mut u8) = (std::ptr::null_mut(), std::ptr::null_mut());
        let (mut y_stride, mut uv_stride): (c_int, c_int) = (0, 0);
        let y = unsafe {
            self.lib.decode_yuv(
                data.as_ptr(),
                data.len(),
                &mut width,
                &mut height,
                &mut u,
                &mut v,
                &mut y_stride,
                &mut uv_stride,
            )
        };
        // U and V live in the same allocation as Y.
        let planes = NativeAllocation::new(&self.lib, y).ok_or(Error::DecodeFailed)?;
        if width <= 0 || height <= 0 || y_stride <= 0 || uv_stride <= 0 {
            return Err(Error::InvalidDimension);
        }
        if u.is_null() || v.is_null() {
            return Err(Error::DecodeFailed);
        }

        let height = height as usize;
        let uv_height = height.div_ceil(2);
        let (y_stride, uv_stride) = (y_stride as usize, uv_stride as usize);
        let y_len = y_stride * height;
        let uv_len = uv_stride * uv_height;
        unsafe {
            Ok(YuvImage {
                y: planes.to_vec(y_len),
                u: std::slice::from_raw_parts(u, uv_len).to_vec(),
                v: std::slice::from_raw_parts(v, uv_len).to_vec(),
                width: width as u32,
                height: height as u32,
                y_stride,
                uv_stride,
            })
        }
    }

    /// Decodes `data` into caller-provided Y, U and V planes.
    ///
    /// Returns the image dimensions.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidData`] if `data` is empty or not a WebP bitstream
    /// - [`Error::BufferTooSmall`] if any plane is empty or too short
    /// - [`Error::InvalidStride`] if a plane's stride is shorter than its row
    /// - [`Error::DecodeFailed`] if libwebp fails to decode
    pub fn decode_yuv_into(&self, data: &[u8], planes: YuvPlanesMut<'_>) -> Result<(u32, u32)> {
        if data.is_empty() {
            return Err(Error::InvalidData);
        }
        if planes.y.is_empty() || planes.u.is_empty() || planes.v.is_empty() {
            return Err(Error::BufferTooSmall { got: 0, need: 1 });
        }
        let (width, height) = self.get_info(data).ok_or(Error::InvalidData)?;
        let (width, height) = (width as usize, height as usize);
        let uv_width = width.div_ceil(2);
        let uv_height = height.div_ceil(2);
        if planes.y_stride < width || planes.u_stride < uv_width || planes.v_stride < uv_width {
            return Err(Error::InvalidStride);
        }
        let y_stride = to_c_int(planes.y_stride).ok_or(Error::InvalidStride)?;
        let u_stride = to_c_int(planes.u_stride).ok_or(Error::InvalidStride)?;
        let v_stride = to_c_int(planes.v_stride).ok_or(Error::InvalidStride)?;
        check_len(planes.y.len(), planes.y_stride, height)?;
        check_len(planes.u.len(), planes.u_stride, uv_height)?;
        check_len(planes.v.len(), planes.v_stride, uv_height)?;

        let ptr = unsafe {
            self.lib.decode_yuv_into(
                data.as_ptr(),
                data.len(),
                planes.y.as_mut_ptr(),
                planes.y.len(),
                y_stride,
                planes.u.as_mut_ptr(),
                planes.u.len(),
                u_stride,
                planes.v.as_mut_ptr(),
                planes.v.len(),
                v_stride,
            )
        };
        if ptr.is_null() {
            return Err(Error::DecodeFailed);
        }
        Ok((width as u32, height as u32))
    }

    /// Runs the advanced decoder with `config`.
    ///
    /// The output lands in [`DecoderConfig::output`]; memory allocated by
    /// libwebp for it is released when `config` is dropped or decoded into
    /// again.
    ///
    /// # Errors
    ///
    /// - [`Error::Status`] with `NotEnoughData` for empty input
    /// - [`Error::Status`] for any failing decode status
    pub fn decode_with_config(&self, data: &[u8], config: &mut DecoderConfig) -> Result<()> {
        if data.is_empty() {
            return Err(Error::Status(crate::StatusCode::NotEnoughData));
        }
        config.release_output();
        let status = unsafe { self.lib.decode(data.as_ptr(), data.len(), &mut config.raw) };
        Error::from_status(status)
    }

    /// Checks `config` with `WebPValidateDecoderConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unavailable`] if the loaded library predates 1.6.0
    /// and does not export the function.
    pub fn validate_decoder_config(&self, config: &DecoderConfig) -> Result<bool> {
        unsafe { self.lib.validate_decoder_config(&config.raw) }
            .map(|ok| ok != 0)
            .ok_or(Error::Unavailable("WebPValidateDecoderConfig"))
    }
}

fn check_len(got: usize, stride: usize, rows: usize) -> Result<()> {
    let need = stride.checked_mul(rows).ok_or(Error::InvalidDimension)?;
    if got < need {
        return Err(Error::BufferTooSmall { got, need });
    }
    Ok(())
}

/// Parameters and output of the advanced decoder (`WebPDecoderConfig`).
///
/// Initialized through the ABI-checked `WebPInitDecoderConfigInternal`.
/// Any output buffer libwebp allocated is released on drop.
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), webp::Error> {
/// # let data: Vec<u8> = Vec::new();
/// let codec = webp::WebpCodec::new()?;
/// let mut config = webp::DecoderConfig::new(&codec)?;
/// config.set_output_mode(webp_sys::MODE_BGRA);
/// config.options_mut().use_threads = 1;
/// codec.decode_with_config(&data, &mut config)?;
/// let pixels = config.rgba_output().unwrap_or_default();
/// # Ok(())
/// # }
/// ```
pub struct DecoderConfig {
    lib: Arc<LibWebp>,
    raw: webp_sys::WebPDecoderConfig,
}

// Safety: the only pointers inside are the output buffer's, which libwebp
// allocated for this config alone.
unsafe impl Send for DecoderConfig {}

impl DecoderConfig {
    /// # Errors
    ///
    /// Returns [`Error::InitFailed`] if libwebp rejects the ABI version.
    pub fn new(codec: &WebpCodec) -> Result<Self> {
        let mut raw = webp_sys::WebPDecoderConfig::default();
        let ok = unsafe {
            codec
                .lib
                .init_decoder_config_internal(&mut raw, webp_sys::WEBP_DECODER_ABI_VERSION)
        };
        if ok == 0 {
            return Err(Error::InitFailed("WebPInitDecoderConfig"));
        }
        Ok(Self {
            lib: codec.lib.clone(),
            raw,
        })
    }

    pub fn options(&self) -> &webp_sys::WebPDecoderOptions {
        &self.raw.options
    }

    pub fn options_mut(&mut self) -> &mut webp_sys::WebPDecoderOptions {
        &mut self.raw.options
    }

    /// Selects the output colorspace of the next decode.
    pub fn set_output_mode(&mut self, mode: webp_sys::WEBP_CSP_MODE) {
        self.raw.output.colorspace = mode;
    }

    /// Features of the last decoded bitstream.
    pub fn input(&self) -> BitstreamFeatures {
        BitstreamFeatures::from(&self.raw.input)
    }

    pub fn output(&self) -> &webp_sys::WebPDecBuffer {
        &self.raw.output
    }

    /// Packed pixels of the last decode, if it used an RGB-family mode.
    pub fn rgba_output(&self) -> Option<&[u8]> {
        rgba_pixels(&self.raw.output)
    }

    pub fn as_raw(&self) -> &webp_sys::WebPDecoderConfig {
        &self.raw
    }

    pub fn as_raw_mut(&mut self) -> &mut webp_sys::WebPDecoderConfig {
        &mut self.raw
    }

    fn release_output(&mut self) {
        release_dec_buffer(&self.lib, &mut self.raw.output);
    }
}

impl Drop for DecoderConfig {
    fn drop(&mut self) {
        self.release_output();
    }
}

impl std::fmt::Debug for DecoderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderConfig")
            .field("options", &self.raw.options)
            .field("colorspace", &self.raw.output.colorspace)
            .finish_non_exhaustive()
    }
}

/// A standalone output buffer (`WebPDecBuffer`) for incremental decoding.
///
/// Initialized through the ABI-checked `WebPInitDecBufferInternal`. The
/// buffer lives on the heap so its address stays fixed while an
/// [`crate::IncrementalDecoder`] writes into it. Memory libwebp allocated for
/// the output is released with `WebPFreeDecBuffer` on drop.
pub struct DecBuffer {
    lib: Arc<LibWebp>,
    pub(crate) raw: Box<webp_sys::WebPDecBuffer>,
}

// Safety: as for `DecoderConfig`, the output memory belongs to this buffer.
unsafe impl Send for DecBuffer {}

impl DecBuffer {
    /// Creates an empty buffer that will receive output in `mode`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidData`] if `mode` is not a colorspace
    /// - [`Error::InitFailed`] if libwebp rejects the ABI version
    pub fn new(codec: &WebpCodec, mode: webp_sys::WEBP_CSP_MODE) -> Result<Self> {
        if !(webp_sys::MODE_RGB..webp_sys::MODE_LAST).contains(&mode) {
            return Err(Error::InvalidData);
        }
        let mut raw = Box::new(webp_sys::WebPDecBuffer::default());
        let ok = unsafe {
            codec
                .lib
                .init_dec_buffer_internal(&mut *raw, webp_sys::WEBP_DECODER_ABI_VERSION)
        };
        if ok == 0 {
            return Err(Error::InitFailed("WebPInitDecBuffer"));
        }
        raw.colorspace = mode;
        Ok(Self {
            lib: codec.lib.clone(),
            raw,
        })
    }

    pub fn colorspace(&self) -> webp_sys::WEBP_CSP_MODE {
        self.raw.colorspace
    }

    pub fn as_raw(&self) -> &webp_sys::WebPDecBuffer {
        &self.raw
    }

    /// Packed pixels, once a decode into an RGB-family mode has finished.
    pub fn rgba_output(&self) -> Option<&[u8]> {
        rgba_pixels(&self.raw)
    }
}

impl Drop for DecBuffer {
    fn drop(&mut self) {
        release_dec_buffer(&self.lib, &mut self.raw);
    }
}

impl std::fmt::Debug for DecBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecBuffer")
            .field("colorspace", &self.raw.colorspace)
            .field("width", &self.raw.width)
            .field("height", &self.raw.height)
            .finish_non_exhaustive()
    }
}

fn rgba_pixels(buffer: &webp_sys::WebPDecBuffer) -> Option<&[u8]> {
    let rgba = buffer.rgba()?;
    if rgba.rgba.is_null() {
        return None;
    }
    Some(unsafe { std::slice::from_raw_parts(rgba.rgba, rgba.size) })
}

/// Frees output memory libwebp allocated for `buffer`, if any.
fn release_dec_buffer(lib: &LibWebp, buffer: &mut webp_sys::WebPDecBuffer) {
    if !buffer.private_memory.is_null() {
        unsafe { lib.free_dec_buffer(buffer) };
    }
}
