// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Symbol resolution seam used by the generated [`crate::LibWebp::load`].

use core::ffi::c_void;

/// A loaded native library that can resolve exported symbols.
///
/// Implemented for [`libloading::Library`]. Other implementations let tests
/// hand out addresses of Rust `extern "C"` functions instead.
pub trait NativeLibrary: Send + Sync {
    /// Returns the address of `symbol`, never null.
    ///
    /// # Safety
    ///
    /// The caller decides what type lives at the returned address; using it
    /// as anything else is undefined behavior.
    unsafe fn resolve(&self, symbol: &str) -> Result<*const c_void, SymbolError>;
}

impl NativeLibrary for libloading::Library {
    unsafe fn resolve(&self, symbol: &str) -> Result<*const c_void, SymbolError> {
        let address = unsafe { self.get::<*const c_void>(symbol.as_bytes()) }
            .map(|sym| *sym)
            .map_err(|err| SymbolError::new(symbol, err.to_string()))?;
        if address.is_null() {
            return Err(SymbolError::new(symbol, "symbol resolved to a null address"));
        }
        Ok(address)
    }
}

/// A symbol could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resolve {symbol}: {reason}")]
pub struct SymbolError {
    pub symbol: String,
    pub reason: String,
}

impl SymbolError {
    pub fn new(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }
}

/// Static description of one generated binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingInfo {
    /// Method name on the library struct.
    pub name: &'static str,
    /// Exported symbol it resolves.
    pub symbol: &'static str,
    pub optional: bool,
}
