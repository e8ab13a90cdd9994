// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Compile-time configuration for locating libwebp.
//!
//! Nothing here is read from the environment: the candidate names are fixed
//! per target OS, and the ABI versions live in [`webp_sys`].

#[cfg(target_os = "linux")]
const CANDIDATE_LIBRARY_NAMES: &[&str] =
    &["libwebp.so", "libwebp.so.8", "libwebp.so.7", "libwebp.so.6"];

#[cfg(target_os = "macos")]
const CANDIDATE_LIBRARY_NAMES: &[&str] = &["libwebp.dylib"];

#[cfg(target_os = "windows")]
const CANDIDATE_LIBRARY_NAMES: &[&str] = &["libwebp.dll", "webp.dll"];

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CANDIDATE_LIBRARY_NAMES: &[&str] = &["libwebp.so"];

/// Returns the library names tried by the process-wide loader, in order.
///
/// The first name that opens wins. On Linux the unversioned development
/// symlink comes first, followed by the runtime sonames from newest to
/// oldest.
///
/// # Examples
///
/// ```
/// let names = webp::config::candidate_library_names();
/// assert!(!names.is_empty());
/// ```
pub fn candidate_library_names() -> &'static [&'static str] {
    CANDIDATE_LIBRARY_NAMES
}
