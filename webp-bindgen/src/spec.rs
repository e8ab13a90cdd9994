// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Function descriptors consumed by the generator.
//!
//! A spec file is a JSON document of the form:
//!
//! ```json
//! {
//!   "functions": [
//!     { "name": "get_info", "signature": "fn(data: *const u8, data_size: usize, width: *mut c_int, height: *mut c_int) -> c_int", "symbol": "WebPGetInfo" },
//!     { "name": "validate_decoder_config", "signature": "fn(config: *const WebPDecoderConfig) -> c_int", "symbol": "WebPValidateDecoderConfig", "optional": true }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{GenerateError, Result};

/// A descriptor file: the ordered list of functions to bind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    pub functions: Vec<FunctionSpec>,
}

/// One foreign function to bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Name of the generated callable.
    pub name: String,
    /// Function pointer type in Rust syntax, e.g. `fn(*const u8, usize) -> c_int`.
    pub signature: String,
    /// Exported native symbol. Defaults to `name` when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Whether the symbol may be missing from the loaded library.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl FunctionSpec {
    /// Creates a mandatory descriptor whose symbol equals its name.
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            symbol: None,
            optional: false,
        }
    }

    /// Binds the descriptor to a differently named native export.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Marks the descriptor as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// The native symbol this descriptor resolves at load time.
    pub fn native_symbol(&self) -> &str {
        match self.symbol.as_deref() {
            Some(symbol) if !symbol.is_empty() => symbol,
            _ => &self.name,
        }
    }
}

impl Spec {
    /// Parses a spec from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a spec file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
