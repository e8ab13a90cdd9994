// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Simple and advanced encoding.

use std::{ffi::c_int, sync::Arc};

use tracing::error;
use webp_sys::LibWebp;

use crate::{
    Error, Result, WebpCodec,
    codec::{NativeAllocation, to_c_int, validate_pixel_input},
};

/// Input layout accepted by the simple encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeLayout {
    Rgba,
    Bgra,
    Rgb,
    Bgr,
}

impl EncodeLayout {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            EncodeLayout::Rgba | EncodeLayout::Bgra => 4,
            EncodeLayout::Rgb | EncodeLayout::Bgr => 3,
        }
    }
}

type LossyFn =
    unsafe fn(&LibWebp, *const u8, c_int, c_int, c_int, f32, *mut *mut u8) -> usize;
type LosslessFn = unsafe fn(&LibWebp, *const u8, c_int, c_int, c_int, *mut *mut u8) -> usize;

fn lossy_fn(layout: EncodeLayout) -> LossyFn {
    match layout {
        EncodeLayout::Rgba => LibWebp::encode_rgba,
        EncodeLayout::Bgra => LibWebp::encode_bgra,
        EncodeLayout::Rgb => LibWebp::encode_rgb,
        EncodeLayout::Bgr => LibWebp::encode_bgr,
    }
}

fn lossless_fn(layout: EncodeLayout) -> LosslessFn {
    match layout {
        EncodeLayout::Rgba => LibWebp::encode_lossless_rgba,
        EncodeLayout::Bgra => LibWebp::encode_lossless_bgra,
        EncodeLayout::Rgb => LibWebp::encode_lossless_rgb,
        EncodeLayout::Bgr => LibWebp::encode_lossless_bgr,
    }
}

/// Pixel input shared by the simple encoders.
struct Input {
    width: c_int,
    height: c_int,
    stride: c_int,
}

fn check_input(
    pixels: &[u8],
    width: usize,
    height: usize,
    stride: usize,
    layout: EncodeLayout,
) -> Result<Input> {
    validate_pixel_input(pixels, width, height, stride, layout.bytes_per_pixel())?;
    Ok(Input {
        width: to_c_int(width).ok_or(Error::InvalidDimension)?,
        height: to_c_int(height).ok_or(Error::InvalidDimension)?,
        stride: to_c_int(stride).ok_or(Error::InvalidStride)?,
    })
}

impl WebpCodec {
    /// Lossy-encodes packed RGBA pixels.
    ///
    /// # Arguments
    ///
    /// * `pixels` - At least `stride * height` bytes
    /// * `stride` - Bytes per row, at least `width * 4`
    /// * `quality` - 0 (smallest) to 100 (best)
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimension`], [`Error::InvalidStride`] or
    ///   [`Error::BufferTooSmall`] if the input does not describe an image
    /// - [`Error::EncodeFailed`] if libwebp produces no output
    pub fn encode_rgba(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
        quality: f32,
    ) -> Result<Vec<u8>> {
        self.encode(pixels, EncodeLayout::Rgba, width, height, stride, quality)
    }

    pub fn encode_bgra(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
        quality: f32,
    ) -> Result<Vec<u8>> {
        self.encode(pixels, EncodeLayout::Bgra, width, height, stride, quality)
    }

    pub fn encode_rgb(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
        quality: f32,
    ) -> Result<Vec<u8>> {
        self.encode(pixels, EncodeLayout::Rgb, width, height, stride, quality)
    }

    pub fn encode_bgr(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
        quality: f32,
    ) -> Result<Vec<u8>> {
        self.encode(pixels, EncodeLayout::Bgr, width, height, stride, quality)
    }

    /// Lossy-encodes packed pixels in `layout`.
    pub fn encode(
        &self,
        pixels: &[u8],
        layout: EncodeLayout,
        width: usize,
        height: usize,
        stride: usize,
        quality: f32,
    ) -> Result<Vec<u8>> {
        let input = check_input(pixels, width, height, stride, layout)?;
        let mut output = std::ptr::null_mut();
        let size = unsafe {
            lossy_fn(layout)(
                &*self.lib,
                pixels.as_ptr(),
                input.width,
                input.height,
                input.stride,
                quality,
                &mut output,
            )
        };
        self.take_output(output, size)
    }

    /// Lossless-encodes packed RGBA pixels.
    ///
    /// # Errors
    ///
    /// Same as [`WebpCodec::encode_rgba`].
    pub fn encode_lossless_rgba(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Vec<u8>> {
        self.encode_lossless(pixels, EncodeLayout::Rgba, width, height, stride)
    }

    pub fn encode_lossless_bgra(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Vec<u8>> {
        self.encode_lossless(pixels, EncodeLayout::Bgra, width, height, stride)
    }

    pub fn encode_lossless_rgb(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Vec<u8>> {
        self.encode_lossless(pixels, EncodeLayout::Rgb, width, height, stride)
    }

    pub fn encode_lossless_bgr(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Vec<u8>> {
        self.encode_lossless(pixels, EncodeLayout::Bgr, width, height, stride)
    }

    /// Lossless-encodes packed pixels in `layout`.
    pub fn encode_lossless(
        &self,
        pixels: &[u8],
        layout: EncodeLayout,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Vec<u8>> {
        let input = check_input(pixels, width, height, stride, layout)?;
        let mut output = std::ptr::null_mut();
        let size = unsafe {
            lossless_fn(layout)(
                &*self.lib,
                pixels.as_ptr(),
                input.width,
                input.height,
                input.stride,
                &mut output,
            )
        };
        self.take_output(output, size)
    }

    fn take_output(&self, output: *mut u8, size: usize) -> Result<Vec<u8>> {
        let output = NativeAllocation::new(&self.lib, output).ok_or(Error::EncodeFailed(None))?;
        if size == 0 {
            return Err(Error::EncodeFailed(None));
        }
        Ok(unsafe { output.to_vec(size) })
    }

    /// Encodes packed RGBA pixels with the advanced API.
    ///
    /// The pixels are imported into a `WebPPicture` and the bitstream is
    /// collected by a `WebPMemoryWriter`; both are released before
    /// returning.
    ///
    /// # Errors
    ///
    /// - Input validation errors as for [`WebpCodec::encode_rgba`]
    /// - [`Error::InitFailed`] if the picture cannot be initialized
    /// - [`Error::EncodeFailed`] with the picture's error code otherwise
    pub fn encode_with_config(
        &self,
        config: &EncoderConfig,
        rgba: &[u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Vec<u8>> {
        let input = check_input(rgba, width, height, stride, EncodeLayout::Rgba)?;

        let mut picture = Picture::new(&self.lib)?;
        picture.raw.width = input.width;
        picture.raw.height = input.height;
        picture.raw.use_argb = config.raw.lossless;
        let imported = unsafe {
            self.lib
                .picture_import_rgba(&mut picture.raw, rgba.as_ptr(), input.stride)
        };
        if imported == 0 {
            return Err(Error::EncodeFailed(Some(picture.raw.error_code)));
        }

        let mut writer = MemoryWriter::new(&self.lib);
        picture.raw.writer = Some(self.lib.memory_write);
        picture.raw.custom_ptr = (&mut writer.raw as *mut webp_sys::WebPMemoryWriter).cast();

        let ok = unsafe { self.lib.encode(&config.raw, &mut picture.raw) };
        if ok == 0 {
            return Err(Error::EncodeFailed(Some(picture.raw.error_code)));
        }
        Ok(writer.to_vec())
    }
}

/// Encoder preset selecting defaults for a kind of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Default,
    Picture,
    Photo,
    Drawing,
    Icon,
    Text,
}

impl Preset {
    pub const fn to_raw(self) -> webp_sys::WebPPreset {
        match self {
            Preset::Default => webp_sys::WEBP_PRESET_DEFAULT,
            Preset::Picture => webp_sys::WEBP_PRESET_PICTURE,
            Preset::Photo => webp_sys::WEBP_PRESET_PHOTO,
            Preset::Drawing => webp_sys::WEBP_PRESET_DRAWING,
            Preset::Icon => webp_sys::WEBP_PRESET_ICON,
            Preset::Text => webp_sys::WEBP_PRESET_TEXT,
        }
    }
}

/// Encoder parameters (`WebPConfig`), initialized through the ABI-checked
/// `WebPConfigInitInternal`.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    lib: Arc<LibWebp>,
    raw: webp_sys::WebPConfig,
}

impl EncoderConfig {
    /// Default preset at quality 75.
    pub fn new(codec: &WebpCodec) -> Result<Self> {
        Self::with_preset(codec, Preset::Default, 75.0)
    }

    /// # Errors
    ///
    /// Returns [`Error::InitFailed`] if libwebp rejects the ABI version.
    pub fn with_preset(codec: &WebpCodec, preset: Preset, quality: f32) -> Result<Self> {
        let mut raw = webp_sys::WebPConfig::default();
        let ok = unsafe {
            codec.lib.config_init_internal(
                &mut raw,
                preset.to_raw(),
                quality,
                webp_sys::WEBP_ENCODER_ABI_VERSION,
            )
        };
        if ok == 0 {
            return Err(Error::InitFailed("WebPConfigInit"));
        }
        Ok(Self {
            lib: codec.lib.clone(),
            raw,
        })
    }

    /// Switches to lossless mode at `level`, 0 (fastest) to 9 (smallest).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InitFailed`] if `level` is out of range.
    pub fn lossless_preset(&mut self, level: i32) -> Result<()> {
        let ok = unsafe { self.lib.config_lossless_preset(&mut self.raw, level) };
        if ok == 0 {
            return Err(Error::InitFailed("WebPConfigLosslessPreset"));
        }
        Ok(())
    }

    /// Whether libwebp accepts the current parameters.
    pub fn validate(&self) -> bool {
        unsafe { self.lib.validate_config(&self.raw) != 0 }
    }

    pub fn as_raw(&self) -> &webp_sys::WebPConfig {
        &self.raw
    }

    pub fn as_raw_mut(&mut self) -> &mut webp_sys::WebPConfig {
        &mut self.raw
    }
}

/// `WebPPicture` released with `WebPPictureFree` on drop.
struct Picture<'a> {
    lib: &'a LibWebp,
    raw: webp_sys::WebPPicture,
}

impl<'a> Picture<'a> {
    fn new(lib: &'a LibWebp) -> Result<Self> {
        let mut raw = webp_sys::WebPPicture::default();
        let ok = unsafe { lib.picture_init_internal(&mut raw, webp_sys::WEBP_ENCODER_ABI_VERSION) };
        if ok == 0 {
            return Err(Error::InitFailed("WebPPictureInit"));
        }
        Ok(Self { lib, raw })
    }
}

impl Drop for Picture<'_> {
    fn drop(&mut self) {
        // The writer lives on the encoding stack frame, never past it.
        self.raw.writer = None;
        self.raw.custom_ptr = std::ptr::null_mut();
        unsafe { self.lib.picture_free(&mut self.raw) };
    }
}

/// `WebPMemoryWriter` released with `WebPMemoryWriterClear` on drop.
struct MemoryWriter<'a> {
    lib: &'a LibWebp,
    raw: webp_sys::WebPMemoryWriter,
}

impl<'a> MemoryWriter<'a> {
    fn new(lib: &'a LibWebp) -> Self {
        let mut raw = webp_sys::WebPMemoryWriter::default();
        unsafe { lib.memory_writer_init(&mut raw) };
        Self { lib, raw }
    }

    fn to_vec(&self) -> Vec<u8> {
        if self.raw.mem.is_null() {
            if self.raw.size != 0 {
                error!(size = self.raw.size, "memory writer reports data without a buffer");
            }
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(self.raw.mem, self.raw.size) }.to_vec()
    }
}

impl Drop for MemoryWriter<'_> {
    fn drop(&mut self) {
        unsafe { self.lib.memory_writer_clear(&mut self.raw) };
    }
}
