// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for libwebp operations.
//!
//! Native status codes are mapped to [`Error`] variants; load failures are
//! carried as [`crate::LoadError`].

use crate::LoadError;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when calling into libwebp.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The library could not be loaded. Every operation fails with the same
    /// error once the load has failed.
    #[error("libwebp unavailable: {0}")]
    Load(#[from] LoadError),

    /// A decode entry point returned a non-OK `VP8StatusCode`.
    #[error("libwebp: decode status {0}")]
    Status(StatusCode),

    /// A decode entry point returned no output.
    #[error("libwebp: decode failed")]
    DecodeFailed,

    /// An encode entry point produced no output. Carries the picture's
    /// error code when the advanced API was used.
    #[error("libwebp: encode failed ({0:?})")]
    EncodeFailed(Option<webp_sys::WebPEncodingError>),

    /// Empty or unrecognized bitstream.
    #[error("libwebp: invalid webp data")]
    InvalidData,

    /// Width or height is not positive or does not fit a C `int`.
    #[error("libwebp: invalid dimensions")]
    InvalidDimension,

    /// Row stride is shorter than one row of pixels.
    #[error("libwebp: invalid stride")]
    InvalidStride,

    /// A caller buffer cannot hold the data it is supposed to hold.
    #[error("libwebp: buffer too small: got={got} need>={need}")]
    BufferTooSmall { got: usize, need: usize },

    /// An optional entry point is not exported by the loaded library.
    #[error("libwebp: {0} is not available in the loaded library")]
    Unavailable(&'static str),

    /// An ABI-versioned initializer rejected its structure, usually because
    /// the loaded library is incompatible with the compiled-in ABI version.
    #[error("libwebp: {0} failed")]
    InitFailed(&'static str),
}

/// Typed `VP8StatusCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    OutOfMemory,
    InvalidParam,
    BitstreamError,
    UnsupportedFeature,
    Suspended,
    UserAbort,
    NotEnoughData,
    Unknown(webp_sys::VP8StatusCode),
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::OutOfMemory => f.write_str("out of memory"),
            StatusCode::InvalidParam => f.write_str("invalid parameter"),
            StatusCode::BitstreamError => f.write_str("bitstream error"),
            StatusCode::UnsupportedFeature => f.write_str("unsupported feature"),
            StatusCode::Suspended => f.write_str("suspended"),
            StatusCode::UserAbort => f.write_str("user abort"),
            StatusCode::NotEnoughData => f.write_str("not enough data"),
            StatusCode::Unknown(code) => write!(f, "unknown ({code})"),
        }
    }
}

impl Error {
    /// Converts a `VP8StatusCode` into a [`Result`].
    ///
    /// # Arguments
    ///
    /// * `status` - The raw status returned by a libwebp decode function
    ///
    /// # Returns
    ///
    /// - `Ok(())` if `status == VP8_STATUS_OK`
    /// - `Err(Error::Status(..))` for any other code
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let status = unsafe { lib.decode(data.as_ptr(), data.len(), config) };
    /// Error::from_status(status)?;
    /// ```
    pub fn from_status(status: webp_sys::VP8StatusCode) -> Result<()> {
        let code = match status {
            webp_sys::VP8_STATUS_OK => return Ok(()),
            webp_sys::VP8_STATUS_OUT_OF_MEMORY => StatusCode::OutOfMemory,
            webp_sys::VP8_STATUS_INVALID_PARAM => StatusCode::InvalidParam,
            webp_sys::VP8_STATUS_BITSTREAM_ERROR => StatusCode::BitstreamError,
            webp_sys::VP8_STATUS_UNSUPPORTED_FEATURE => StatusCode::UnsupportedFeature,
            webp_sys::VP8_STATUS_SUSPENDED => StatusCode::Suspended,
            webp_sys::VP8_STATUS_USER_ABORT => StatusCode::UserAbort,
            webp_sys::VP8_STATUS_NOT_ENOUGH_DATA => StatusCode::NotEnoughData,
            other => StatusCode::Unknown(other),
        };
        Err(Error::Status(code))
    }
}
