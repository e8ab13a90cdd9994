// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures: an in-process stand-in for libwebp.
//!
//! The fake understands a toy bitstream, `b"FAKE"`, one width byte, one
//! height byte, then `width * height` payload bytes. Every buffer it hands
//! out is tracked per thread so tests can check that the safe layer releases
//! what it receives.

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
    ffi::{c_float, c_int, c_void},
    sync::atomic::{AtomicUsize, Ordering},
};

use webp::{LibraryOpener, Loader, WebpCodec};
use webp_sys::*;

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

pub fn setup_logging() {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .with_test_writer()
            .init();
    });
}

pub const FAKE_VERSION: c_int = 0x010600;

/// Builds a toy bitstream the fake library decodes.
pub fn fake_webp(width: u8, height: u8) -> Vec<u8> {
    let mut data = b"FAKE".to_vec();
    data.extend([width, height]);
    data.extend((0..width as usize * height as usize).map(|i| i as u8));
    data
}

/// Byte the fake decoders write at `col` of row `row`.
pub fn pixel_byte(row: usize, col: usize) -> u8 {
    (row * 7 + col) as u8
}

thread_local! {
    static ALLOCATIONS: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());
    static BAD_FREES: Cell<usize> = const { Cell::new(0) };
    static DELETED_DECODERS: Cell<usize> = const { Cell::new(0) };
}

/// Buffers handed out by the fake on this thread and not yet released.
pub fn live_allocations() -> usize {
    ALLOCATIONS.with(|a| a.borrow().len())
}

/// Releases of pointers the fake never handed out.
pub fn bad_frees() -> usize {
    BAD_FREES.with(Cell::get)
}

pub fn deleted_decoders() -> usize {
    DELETED_DECODERS.with(Cell::get)
}

fn allocate(len: usize) -> *mut u8 {
    let len = len.max(1);
    let ptr = Box::into_raw(vec![0u8; len].into_boxed_slice()).cast::<u8>();
    ALLOCATIONS.with(|a| a.borrow_mut().insert(ptr as usize, len));
    ptr
}

fn release(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    match ALLOCATIONS.with(|a| a.borrow_mut().remove(&(ptr as usize))) {
        Some(len) => drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) }),
        None => BAD_FREES.with(|c| c.set(c.get() + 1)),
    }
}

fn header(data: &[u8]) -> Option<(c_int, c_int)> {
    if data.len() < 6 || &data[..4] != b"FAKE" || data[4] == 0 || data[5] == 0 {
        return None;
    }
    Some((data[4] as c_int, data[5] as c_int))
}

unsafe fn input<'a>(data: *const u8, size: usize) -> &'a [u8] {
    if data.is_null() {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(data, size) }
}

fn mode_bytes_per_pixel(mode: WEBP_CSP_MODE) -> usize {
    match mode {
        MODE_RGB | MODE_BGR => 3,
        MODE_RGBA_4444 | MODE_RGB_565 | MODE_rgbA_4444 => 2,
        _ => 4,
    }
}

/// Writes `rows` rows of the decode pattern.
unsafe fn fill_rows(out: *mut u8, row_bytes: usize, stride: usize, rows: usize) {
    for row in 0..rows {
        for col in 0..row_bytes {
            unsafe { *out.add(row * stride + col) = pixel_byte(row, col) };
        }
    }
}

unsafe extern "C" fn get_decoder_version() -> c_int {
    FAKE_VERSION
}

unsafe extern "C" fn get_encoder_version() -> c_int {
    FAKE_VERSION + 1
}

unsafe extern "C" fn get_info(
    data: *const u8,
    size: usize,
    width: *mut c_int,
    height: *mut c_int,
) -> c_int {
    match header(unsafe { input(data, size) }) {
        Some((w, h)) => {
            unsafe {
                *width = w;
                *height = h;
            }
            1
        }
        None => 0,
    }
}

unsafe extern "C" fn get_features(
    data: *const u8,
    size: usize,
    features: *mut WebPBitstreamFeatures,
    version: c_int,
) -> VP8StatusCode {
    if version != WEBP_DECODER_ABI_VERSION {
        return VP8_STATUS_INVALID_PARAM;
    }
    let data = unsafe { input(data, size) };
    match header(data) {
        Some((width, height)) => {
            unsafe {
                *features = WebPBitstreamFeatures {
                    width,
                    height,
                    has_alpha: 1,
                    format: WEBP_FORMAT_LOSSLESS,
                    ..Default::default()
                };
            }
            VP8_STATUS_OK
        }
        None if data.len() < 6 => VP8_STATUS_NOT_ENOUGH_DATA,
        None => VP8_STATUS_BITSTREAM_ERROR,
    }
}

unsafe extern "C" fn decode_packed<const BPP: usize>(
    data: *const u8,
    size: usize,
    width: *mut c_int,
    height: *mut c_int,
) -> *mut u8 {
    let Some((w, h)) = header(unsafe { input(data, size) }) else {
        return std::ptr::null_mut();
    };
    let stride = w as usize * BPP;
    let out = allocate(stride * h as usize);
    unsafe {
        fill_rows(out, stride, stride, h as usize);
        *width = w;
        *height = h;
    }
    out
}

unsafe extern "C" fn decode_packed_into<const BPP: usize>(
    data: *const u8,
    size: usize,
    output: *mut u8,
    output_size: usize,
    stride: c_int,
) -> *mut u8 {
    let Some((w, h)) = header(unsafe { input(data, size) }) else {
        return std::ptr::null_mut();
    };
    let row_bytes = w as usize * BPP;
    let stride = stride as usize;
    if stride < row_bytes || output_size < stride * h as usize {
        return std::ptr::null_mut();
    }
    unsafe { fill_rows(output, row_bytes, stride, h as usize) };
    output
}

unsafe extern "C" fn decode_yuv(
    data: *const u8,
    size: usize,
    width: *mut c_int,
    height: *mut c_int,
    u: *mut *mut u8,
    v: *mut *mut u8,
    stride: *mut c_int,
    uv_stride: *mut c_int,
) -> *mut u8 {
    let Some((w, h)) = header(unsafe { input(data, size) }) else {
        return std::ptr::null_mut();
    };
    let (w_us, h_us) = (w as usize, h as usize);
    let (uv_w, uv_h) = (w_us.div_ceil(2), h_us.div_ceil(2));
    let y_len = w_us * h_us;
    let uv_len = uv_w * uv_h;
    let y = allocate(y_len + 2 * uv_len);
    unsafe {
        std::ptr::write_bytes(y, 0x10, y_len);
        std::ptr::write_bytes(y.add(y_len), 0x80, uv_len);
        std::ptr::write_bytes(y.add(y_len + uv_len), 0x90, uv_len);
        *width = w;
        *height = h;
        *u = y.add(y_len);
        *v = y.add(y_len + uv_len);
        *stride = w;
        *uv_stride = uv_w as c_int;
    }
    y
}

unsafe extern "C" fn decode_yuv_into(
    data: *const u8,
    size: usize,
    luma: *mut u8,
    luma_size: usize,
    luma_stride: c_int,
    u: *mut u8,
    u_size: usize,
    u_stride: c_int,
    v: *mut u8,
    v_size: usize,
    v_stride: c_int,
) -> *mut u8 {
    let Some((_, h)) = header(unsafe { input(data, size) }) else {
        return std::ptr::null_mut();
    };
    let uv_h = (h as usize).div_ceil(2);
    if luma_size < luma_stride as usize * h as usize
        || u_size < u_stride as usize * uv_h
        || v_size < v_stride as usize * uv_h
    {
        return std::ptr::null_mut();
    }
    unsafe {
        std::ptr::write_bytes(luma, 0x10, luma_stride as usize * h as usize);
        std::ptr::write_bytes(u, 0x80, u_stride as usize * uv_h);
        std::ptr::write_bytes(v, 0x90, v_stride as usize * uv_h);
    }
    luma
}

unsafe extern "C" fn free(ptr: *mut c_void) {
    release(ptr.cast());
}

unsafe extern "C" fn init_decoder_config(config: *mut WebPDecoderConfig, version: c_int) -> c_int {
    if version != WEBP_DECODER_ABI_VERSION {
        return 0;
    }
    unsafe { *config = WebPDecoderConfig::default() };
    1
}

unsafe extern "C" fn init_dec_buffer(buffer: *mut WebPDecBuffer, version: c_int) -> c_int {
    if version != WEBP_DECODER_ABI_VERSION {
        return 0;
    }
    unsafe { *buffer = WebPDecBuffer::default() };
    1
}

unsafe extern "C" fn validate_decoder_config(config: *const WebPDecoderConfig) -> c_int {
    let options = unsafe { &(*config).options };
    let bad_crop =
        options.use_cropping != 0 && (options.crop_width <= 0 || options.crop_height <= 0);
    (!bad_crop) as c_int
}

unsafe extern "C" fn decode_advanced(
    data: *const u8,
    size: usize,
    config: *mut WebPDecoderConfig,
) -> VP8StatusCode {
    let config = unsafe { &mut *config };
    let Some((w, h)) = header(unsafe { input(data, size) }) else {
        return VP8_STATUS_BITSTREAM_ERROR;
    };
    config.input = WebPBitstreamFeatures {
        width: w,
        height: h,
        has_alpha: 1,
        format: WEBP_FORMAT_LOSSLESS,
        ..Default::default()
    };
    let mode = config.output.colorspace;
    if !is_rgb_mode(mode) {
        return VP8_STATUS_UNSUPPORTED_FEATURE;
    }
    let stride = w as usize * mode_bytes_per_pixel(mode);
    let len = stride * h as usize;
    let out = allocate(len);
    unsafe { fill_rows(out, stride, stride, h as usize) };
    let rgba = WebPRGBABuffer {
        rgba: out,
        stride: stride as c_int,
        size: len,
    };
    if config.output.set_output(mode, DecOutput::Rgba(rgba)).is_err() {
        release(out);
        return VP8_STATUS_INVALID_PARAM;
    }
    config.output.width = w;
    config.output.height = h;
    config.output.private_memory = out;
    VP8_STATUS_OK
}

unsafe extern "C" fn free_dec_buffer(buffer: *mut WebPDecBuffer) {
    let buffer = unsafe { &mut *buffer };
    release(buffer.private_memory);
    buffer.private_memory = std::ptr::null_mut();
    let _ = buffer.set_output(buffer.colorspace, DecOutput::Rgba(WebPRGBABuffer::default()));
}

unsafe extern "C" fn encode_lossy<const TAG: u8>(
    _pixels: *const u8,
    width: c_int,
    height: c_int,
    _stride: c_int,
    quality: c_float,
    output: *mut *mut u8,
) -> usize {
    unsafe { encode_simple(width, height, TAG, quality as u8, output) }
}

unsafe extern "C" fn encode_lossless<const TAG: u8>(
    _pixels: *const u8,
    width: c_int,
    height: c_int,
    _stride: c_int,
    output: *mut *mut u8,
) -> usize {
    unsafe { encode_simple(width, height, TAG, 0xff, output) }
}

unsafe fn encode_simple(
    width: c_int,
    height: c_int,
    tag: u8,
    quality: u8,
    output: *mut *mut u8,
) -> usize {
    if width > 255 || height > 255 {
        return 0;
    }
    let bytes = [b'F', b'A', b'K', b'E', width as u8, height as u8, tag, quality];
    let out = allocate(bytes.len());
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), out, bytes.len());
        *output = out;
    }
    bytes.len()
}

unsafe extern "C" fn config_init(
    config: *mut WebPConfig,
    preset: WebPPreset,
    quality: c_float,
    version: c_int,
) -> c_int {
    if version != WEBP_ENCODER_ABI_VERSION || !(0..=WEBP_PRESET_TEXT).contains(&preset) {
        return 0;
    }
    unsafe {
        *config = WebPConfig {
            quality,
            method: 4,
            segments: 4,
            image_hint: WEBP_HINT_DEFAULT,
            ..Default::default()
        };
    }
    1
}

unsafe extern "C" fn config_lossless_preset(config: *mut WebPConfig, level: c_int) -> c_int {
    if !(0..=9).contains(&level) {
        return 0;
    }
    let config = unsafe { &mut *config };
    config.lossless = 1;
    config.method = level.min(6);
    1
}

unsafe extern "C" fn validate_config(config: *const WebPConfig) -> c_int {
    let config = unsafe { &*config };
    ((0.0..=100.0).contains(&config.quality) && (0..=6).contains(&config.method)) as c_int
}

unsafe extern "C" fn picture_init(picture: *mut WebPPicture, version: c_int) -> c_int {
    if version != WEBP_ENCODER_ABI_VERSION {
        return 0;
    }
    unsafe { *picture = WebPPicture::default() };
    1
}

unsafe extern "C" fn picture_import_rgba(
    picture: *mut WebPPicture,
    rgba: *const u8,
    stride: c_int,
) -> c_int {
    let picture = unsafe { &mut *picture };
    if picture.width <= 0 || picture.height <= 0 {
        picture.error_code = VP8_ENC_ERROR_BAD_DIMENSION;
        return 0;
    }
    let row = picture.width as usize * 4;
    let rows = picture.height as usize;
    let argb = allocate(row * rows);
    for y in 0..rows {
        unsafe {
            std::ptr::copy_nonoverlapping(rgba.add(y * stride as usize), argb.add(y * row), row)
        };
    }
    picture.argb = argb.cast();
    picture.argb_stride = picture.width;
    picture.memory_argb_ = argb.cast();
    1
}

unsafe extern "C" fn picture_free(picture: *mut WebPPicture) {
    let picture = unsafe { &mut *picture };
    release(picture.memory_argb_.cast());
    picture.memory_argb_ = std::ptr::null_mut();
    picture.argb = std::ptr::null_mut();
}

unsafe extern "C" fn memory_writer_init(writer: *mut WebPMemoryWriter) {
    unsafe { *writer = WebPMemoryWriter::default() };
}

unsafe extern "C" fn memory_writer_clear(writer: *mut WebPMemoryWriter) {
    let writer = unsafe { &mut *writer };
    release(writer.mem);
    *writer = WebPMemoryWriter::default();
}

unsafe extern "C" fn memory_write(
    data: *const u8,
    size: usize,
    picture: *const WebPPicture,
) -> c_int {
    let writer = unsafe { &mut *(*picture).custom_ptr.cast::<WebPMemoryWriter>() };
    let grown = allocate(writer.size + size);
    unsafe {
        if !writer.mem.is_null() {
            std::ptr::copy_nonoverlapping(writer.mem, grown, writer.size);
        }
        std::ptr::copy_nonoverlapping(data, grown.add(writer.size), size);
    }
    release(writer.mem);
    writer.mem = grown;
    writer.size += size;
    writer.max_size = writer.size;
    1
}

unsafe extern "C" fn encode_advanced(
    config: *const WebPConfig,
    picture: *mut WebPPicture,
) -> c_int {
    let lossless = unsafe { (*config).lossless } as u8;
    if unsafe { validate_config(config) } == 0 {
        unsafe { (*picture).error_code = VP8_ENC_ERROR_INVALID_CONFIGURATION };
        return 0;
    }
    let pic = unsafe { &mut *picture };
    let Some(write) = pic.writer else {
        pic.error_code = VP8_ENC_ERROR_BAD_WRITE;
        return 0;
    };
    if pic.argb.is_null() {
        pic.error_code = VP8_ENC_ERROR_NULL_PARAMETER;
        return 0;
    }
    let header = [b'F', b'A', b'K', b'E', pic.width as u8, pic.height as u8, lossless];
    let payload_len = pic.width as usize * pic.height as usize * 4;
    let payload = pic.argb.cast::<u8>();
    unsafe {
        write(header.as_ptr(), header.len(), picture);
        write(payload, payload_len, picture);
    }
    1
}

/// State behind a fake `WebPIDecoder*`.
struct FakeIdec {
    mode: WEBP_CSP_MODE,
    data: Vec<u8>,
    pixels: Vec<u8>,
    y: Vec<u8>,
    u: Vec<u8>,
    v: Vec<u8>,
    area: WebPDecBuffer,
    /// Caller-owned buffer receiving the finished picture, or null.
    final_output: *mut WebPDecBuffer,
}

impl FakeIdec {
    fn boxed(mode: WEBP_CSP_MODE, final_output: *mut WebPDecBuffer) -> *mut WebPIDecoder {
        Box::into_raw(Box::new(FakeIdec {
            mode,
            data: Vec::new(),
            pixels: Vec::new(),
            y: Vec::new(),
            u: Vec::new(),
            v: Vec::new(),
            area: WebPDecBuffer::default(),
            final_output,
        }))
        .cast()
    }

    /// `(width, height, complete rows)` once the header has arrived.
    fn rows(&self) -> Option<(c_int, c_int, c_int)> {
        let (w, h) = header(&self.data)?;
        let rows = (self.data.len() - 6) / w as usize;
        Some((w, h, rows.min(h as usize) as c_int))
    }

    fn status(&self) -> VP8StatusCode {
        match self.rows() {
            Some((_, h, rows)) if rows == h => VP8_STATUS_OK,
            Some(_) => VP8_STATUS_SUSPENDED,
            None if self.data.len() < 6 => VP8_STATUS_SUSPENDED,
            None => VP8_STATUS_BITSTREAM_ERROR,
        }
    }

    /// Status after new data, writing the picture to `final_output` once
    /// the last row arrives.
    fn advance(&mut self) -> VP8StatusCode {
        let status = self.status();
        if status != VP8_STATUS_OK || self.final_output.is_null() || !is_rgb_mode(self.mode) {
            return status;
        }
        let output = unsafe { &mut *self.final_output };
        if !output.private_memory.is_null() {
            return status;
        }
        let Some((w, h, _)) = self.rows() else {
            return status;
        };
        let stride = w as usize * mode_bytes_per_pixel(self.mode);
        let len = stride * h as usize;
        let out = allocate(len);
        unsafe { fill_rows(out, stride, stride, h as usize) };
        let rgba = WebPRGBABuffer {
            rgba: out,
            stride: stride as c_int,
            size: len,
        };
        if output.set_output(self.mode, DecOutput::Rgba(rgba)).is_err() {
            release(out);
            return VP8_STATUS_INVALID_PARAM;
        }
        output.width = w;
        output.height = h;
        output.private_memory = out;
        status
    }
}

unsafe fn idec_state<'a>(idec: *const WebPIDecoder) -> &'a mut FakeIdec {
    unsafe { &mut *(idec as *mut WebPIDecoder).cast::<FakeIdec>() }
}

unsafe extern "C" fn inew_rgb(
    csp: WEBP_CSP_MODE,
    _output: *mut u8,
    _output_size: usize,
    _stride: c_int,
) -> *mut WebPIDecoder {
    FakeIdec::boxed(csp, std::ptr::null_mut())
}

unsafe extern "C" fn inew_yuva(
    _luma: *mut u8,
    _luma_size: usize,
    _luma_stride: c_int,
    _u: *mut u8,
    _u_size: usize,
    _u_stride: c_int,
    _v: *mut u8,
    _v_size: usize,
    _v_stride: c_int,
    _a: *mut u8,
    _a_size: usize,
    _a_stride: c_int,
) -> *mut WebPIDecoder {
    FakeIdec::boxed(MODE_YUVA, std::ptr::null_mut())
}

unsafe extern "C" fn inew_yuv(
    _luma: *mut u8,
    _luma_size: usize,
    _luma_stride: c_int,
    _u: *mut u8,
    _u_size: usize,
    _u_stride: c_int,
    _v: *mut u8,
    _v_size: usize,
    _v_stride: c_int,
) -> *mut WebPIDecoder {
    FakeIdec::boxed(MODE_YUV, std::ptr::null_mut())
}

unsafe extern "C" fn inew_decoder(output: *mut WebPDecBuffer) -> *mut WebPIDecoder {
    if output.is_null() {
        return FakeIdec::boxed(MODE_RGB, std::ptr::null_mut());
    }
    FakeIdec::boxed(unsafe { (*output).colorspace }, output)
}

/// Only parses the features; the bitstream is fed afterwards.
unsafe extern "C" fn idecode(
    data: *const u8,
    size: usize,
    config: *mut WebPDecoderConfig,
) -> *mut WebPIDecoder {
    let data = unsafe { input(data, size) };
    if config.is_null() {
        return FakeIdec::boxed(MODE_RGB, std::ptr::null_mut());
    }
    let config = unsafe { &mut *config };
    if data.len() >= 6 {
        let Some((w, h)) = header(data) else {
            return std::ptr::null_mut();
        };
        config.input = WebPBitstreamFeatures {
            width: w,
            height: h,
            has_alpha: 1,
            format: WEBP_FORMAT_LOSSLESS,
            ..Default::default()
        };
    }
    FakeIdec::boxed(config.output.colorspace, &mut config.output)
}

unsafe extern "C" fn idelete(idec: *mut WebPIDecoder) {
    drop(unsafe { Box::from_raw(idec.cast::<FakeIdec>()) });
    DELETED_DECODERS.with(|c| c.set(c.get() + 1));
}

unsafe extern "C" fn iappend(
    idec: *mut WebPIDecoder,
    data: *const u8,
    size: usize,
) -> VP8StatusCode {
    let state = unsafe { idec_state(idec) };
    state.data.extend_from_slice(unsafe { input(data, size) });
    state.advance()
}

unsafe extern "C" fn iupdate(
    idec: *mut WebPIDecoder,
    data: *const u8,
    size: usize,
) -> VP8StatusCode {
    let state = unsafe { idec_state(idec) };
    state.data = unsafe { input(data, size) }.to_vec();
    state.advance()
}

unsafe extern "C" fn idec_get_rgb(
    idec: *const WebPIDecoder,
    last_y: *mut c_int,
    width: *mut c_int,
    height: *mut c_int,
    stride: *mut c_int,
) -> *mut u8 {
    let state = unsafe { idec_state(idec) };
    if !is_rgb_mode(state.mode) {
        return std::ptr::null_mut();
    }
    let Some((w, h, rows)) = state.rows() else {
        return std::ptr::null_mut();
    };
    let row_bytes = w as usize * mode_bytes_per_pixel(state.mode);
    state.pixels.resize(row_bytes * h as usize, 0);
    unsafe {
        fill_rows(state.pixels.as_mut_ptr(), row_bytes, row_bytes, rows as usize);
        *last_y = rows;
        *width = w;
        *height = h;
        *stride = row_bytes as c_int;
    }
    state.pixels.as_mut_ptr()
}

unsafe extern "C" fn idec_get_yuva(
    idec: *const WebPIDecoder,
    last_y: *mut c_int,
    u: *mut *mut u8,
    v: *mut *mut u8,
    a: *mut *mut u8,
    width: *mut c_int,
    height: *mut c_int,
    stride: *mut c_int,
    uv_stride: *mut c_int,
    a_stride: *mut c_int,
) -> *mut u8 {
    let state = unsafe { idec_state(idec) };
    if state.mode != MODE_YUVA && state.mode != MODE_YUV {
        return std::ptr::null_mut();
    }
    let Some((w, h, rows)) = state.rows() else {
        return std::ptr::null_mut();
    };
    let (w_us, h_us) = (w as usize, h as usize);
    let uv_w = w_us.div_ceil(2);
    state.y.resize(w_us * h_us, 0x10);
    state.u.resize(uv_w * h_us.div_ceil(2), 0x80);
    state.v.resize(uv_w * h_us.div_ceil(2), 0x90);
    unsafe {
        *last_y = rows;
        *u = state.u.as_mut_ptr();
        *v = state.v.as_mut_ptr();
        *a = std::ptr::null_mut();
        *width = w;
        *height = h;
        *stride = w;
        *uv_stride = uv_w as c_int;
        *a_stride = 0;
    }
    state.y.as_mut_ptr()
}

unsafe extern "C" fn idecoded_area(
    idec: *const WebPIDecoder,
    left: *mut c_int,
    top: *mut c_int,
    width: *mut c_int,
    height: *mut c_int,
) -> *const WebPDecBuffer {
    let state = unsafe { idec_state(idec) };
    let Some((w, _, rows)) = state.rows() else {
        return std::ptr::null();
    };
    unsafe {
        *left = 0;
        *top = 0;
        *width = w;
        *height = rows;
    }
    &state.area
}

unsafe extern "C" fn unexpected_call() {
    // Unwinding out of an extern "C" function aborts the process.
    std::process::abort();
}

/// Serves libwebp symbols from the fake functions above.
pub struct FakeLibrary {
    missing: HashSet<&'static str>,
}

impl NativeLibrary for FakeLibrary {
    unsafe fn resolve(&self, symbol: &str) -> Result<*const c_void, SymbolError> {
        if self.missing.contains(symbol) {
            return Err(SymbolError::new(symbol, "undefined symbol"));
        }
        let address = match symbol {
            "WebPGetDecoderVersion" => get_decoder_version as *const c_void,
            "WebPGetEncoderVersion" => get_encoder_version as *const c_void,
            "WebPGetInfo" => get_info as *const c_void,
            "WebPGetFeaturesInternal" => get_features as *const c_void,
            "WebPInitDecoderConfigInternal" => init_decoder_config as *const c_void,
            "WebPInitDecBufferInternal" => init_dec_buffer as *const c_void,
            "WebPValidateDecoderConfig" => validate_decoder_config as *const c_void,
            "WebPDecode" => decode_advanced as *const c_void,
            "WebPFreeDecBuffer" => free_dec_buffer as *const c_void,
            "WebPDecodeRGBA" | "WebPDecodeARGB" | "WebPDecodeBGRA" => {
                decode_packed::<4> as *const c_void
            }
            "WebPDecodeRGB" | "WebPDecodeBGR" => decode_packed::<3> as *const c_void,
            "WebPDecodeRGBAInto" | "WebPDecodeARGBInto" | "WebPDecodeBGRAInto" => {
                decode_packed_into::<4> as *const c_void
            }
            "WebPDecodeRGBInto" | "WebPDecodeBGRInto" => decode_packed_into::<3> as *const c_void,
            "WebPDecodeYUV" => decode_yuv as *const c_void,
            "WebPDecodeYUVInto" => decode_yuv_into as *const c_void,
            "WebPFree" => free as *const c_void,
            "WebPEncodeRGBA" => encode_lossy::<b'a'> as *const c_void,
            "WebPEncodeBGRA" => encode_lossy::<b'b'> as *const c_void,
            "WebPEncodeRGB" => encode_lossy::<b'r'> as *const c_void,
            "WebPEncodeBGR" => encode_lossy::<b'g'> as *const c_void,
            "WebPEncodeLosslessRGBA" => encode_lossless::<b'A'> as *const c_void,
            "WebPEncodeLosslessBGRA" => encode_lossless::<b'B'> as *const c_void,
            "WebPEncodeLosslessRGB" => encode_lossless::<b'R'> as *const c_void,
            "WebPEncodeLosslessBGR" => encode_lossless::<b'G'> as *const c_void,
            "WebPConfigInitInternal" => config_init as *const c_void,
            "WebPConfigLosslessPreset" => config_lossless_preset as *const c_void,
            "WebPValidateConfig" => validate_config as *const c_void,
            "WebPPictureInitInternal" => picture_init as *const c_void,
            "WebPPictureImportRGBA" => picture_import_rgba as *const c_void,
            "WebPPictureFree" => picture_free as *const c_void,
            "WebPMemoryWriterInit" => memory_writer_init as *const c_void,
            "WebPMemoryWriterClear" => memory_writer_clear as *const c_void,
            "WebPMemoryWrite" => memory_write as *const c_void,
            "WebPEncode" => encode_advanced as *const c_void,
            "WebPINewRGB" => inew_rgb as *const c_void,
            "WebPINewYUVA" => inew_yuva as *const c_void,
            "WebPINewYUV" => inew_yuv as *const c_void,
            "WebPINewDecoder" => inew_decoder as *const c_void,
            "WebPIDecode" => idecode as *const c_void,
            "WebPIDelete" => idelete as *const c_void,
            "WebPIAppend" => iappend as *const c_void,
            "WebPIUpdate" => iupdate as *const c_void,
            "WebPIDecGetRGB" => idec_get_rgb as *const c_void,
            "WebPIDecGetYUVA" => idec_get_yuva as *const c_void,
            "WebPIDecodedArea" => idecoded_area as *const c_void,
            _ => unexpected_call as *const c_void,
        };
        Ok(address)
    }
}

/// Opener handing out [`FakeLibrary`] and counting attempts.
pub struct FakeOpener {
    opens: AtomicUsize,
    /// Names that open; empty means every name opens.
    present: Vec<String>,
    /// Opens nothing when set.
    absent: bool,
    missing: Vec<&'static str>,
}

impl FakeOpener {
    /// Opens every name.
    pub fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            present: Vec::new(),
            absent: false,
            missing: Vec::new(),
        }
    }

    /// Opens no name at all.
    pub fn absent() -> Self {
        Self {
            absent: true,
            ..Self::new()
        }
    }

    /// Opens only `names`.
    pub fn only(names: &[&str]) -> Self {
        Self {
            present: names.iter().map(|n| n.to_string()).collect(),
            ..Self::new()
        }
    }

    /// Leaves `symbols` unresolvable in the opened library.
    pub fn without(mut self, symbols: &[&'static str]) -> Self {
        self.missing.extend_from_slice(symbols);
        self
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl LibraryOpener for FakeOpener {
    fn open(&self, name: &str) -> Result<Box<dyn NativeLibrary>, String> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let opens = !self.absent
            && (self.present.is_empty() || self.present.iter().any(|n| n == name));
        if !opens {
            return Err(format!(
                "{name}: cannot open shared object file: No such file or directory"
            ));
        }
        Ok(Box::new(FakeLibrary {
            missing: self.missing.iter().copied().collect(),
        }))
    }
}

/// A codec bound to the fake library.
pub fn fake_codec() -> WebpCodec {
    fake_codec_without(&[])
}

pub fn fake_codec_without(missing: &[&'static str]) -> WebpCodec {
    setup_logging();
    let loader = Loader::with_candidates(FakeOpener::new().without(missing), ["libwebp-fake.so"]);
    WebpCodec::with_loader(&loader).unwrap()
}
