// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! One-time discovery, loading and symbol binding of libwebp.
//!
//! A [`Loader`] tries its candidate library names in order, binds every
//! symbol of the generated [`LibWebp`] table from the first library that
//! opens, and memoizes the outcome. The outcome never changes afterwards:
//! a failed load is not retried.

use std::{
    fmt::Write as _,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::{debug, info, warn};
use webp_sys::{LibWebp, NativeLibrary};

/// Opens a native library by name.
///
/// [`SystemOpener`] is what the process-wide loader uses. Tests supply their
/// own to count attempts or to serve symbols from Rust functions.
pub trait LibraryOpener: Send + Sync {
    /// Opens `name`, returning a human-readable cause on failure.
    fn open(&self, name: &str) -> Result<Box<dyn NativeLibrary>, String>;
}

/// Opens libraries through the platform dynamic loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl LibraryOpener for SystemOpener {
    fn open(&self, name: &str) -> Result<Box<dyn NativeLibrary>, String> {
        // Safety: libwebp has no load-time initializers with side effects.
        let library = unsafe { libloading::Library::new(name) }.map_err(|err| err.to_string())?;
        Ok(Box::new(library))
    }
}

/// Why a [`Loader`] could not produce a usable library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// No candidate could be opened. Holds every `(candidate, cause)` pair
    /// in the order tried.
    #[error("unable to load libwebp: {}", describe_attempts(.attempts))]
    LibraryNotFound { attempts: Vec<(String, String)> },

    /// The library opened but a mandatory symbol is missing.
    #[error("resolve {symbol}: {reason}")]
    MandatorySymbolMissing { symbol: String, reason: String },
}

fn describe_attempts(attempts: &[(String, String)]) -> String {
    if attempts.is_empty() {
        return "no candidate library names".to_string();
    }
    let mut out = String::new();
    for (i, (name, cause)) in attempts.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        let _ = write!(out, "{name}: {cause}");
    }
    out
}

/// Observable state of a [`Loader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    /// A thread is opening the library and binding symbols.
    Loading,
    Loaded,
    Failed(LoadError),
}

/// Loads libwebp at most once and hands out the shared result.
///
/// `ensure_loaded` may be called from any number of threads. Exactly one of
/// them performs discovery and binding; the rest block until it finishes and
/// then observe the same outcome.
///
/// # Examples
///
/// ```no_run
/// use webp::{Loader, SystemOpener};
///
/// let loader = Loader::new(SystemOpener);
/// match loader.ensure_loaded() {
///     Ok(lib) => println!("loaded {lib:?}"),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
pub struct Loader<O = SystemOpener> {
    opener: O,
    candidates: Vec<String>,
    started: AtomicBool,
    outcome: OnceLock<Result<Arc<LibWebp>, LoadError>>,
}

impl<O: LibraryOpener> Loader<O> {
    /// Creates a loader trying [`crate::config::candidate_library_names`].
    pub fn new(opener: O) -> Self {
        Self::with_candidates(
            opener,
            crate::config::candidate_library_names()
                .iter()
                .map(|name| name.to_string()),
        )
    }

    /// Creates a loader trying `candidates` in order.
    pub fn with_candidates<I, S>(opener: O, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            opener,
            candidates: candidates.into_iter().map(Into::into).collect(),
            started: AtomicBool::new(false),
            outcome: OnceLock::new(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Loads the library on first call and returns the memoized outcome.
    ///
    /// # Errors
    ///
    /// - [`LoadError::LibraryNotFound`] if no candidate opens
    /// - [`LoadError::MandatorySymbolMissing`] if the opened library lacks a
    ///   mandatory entry point
    pub fn ensure_loaded(&self) -> Result<Arc<LibWebp>, LoadError> {
        self.outcome
            .get_or_init(|| {
                let _started = Started::set(&self.started);
                self.load()
            })
            .clone()
    }

    /// Whether the library is usable. Triggers the load if needed.
    pub fn available(&self) -> bool {
        self.ensure_loaded().is_ok()
    }

    /// Whether the binding called `name` is present.
    ///
    /// Triggers the load if needed. Returns `false` when the load failed or
    /// no binding has that name.
    pub fn capability(&self, name: &str) -> bool {
        self.ensure_loaded()
            .ok()
            .and_then(|lib| lib.is_bound(name))
            .unwrap_or(false)
    }

    /// Current state, without triggering a load.
    pub fn state(&self) -> LoadState {
        match self.outcome.get() {
            Some(Ok(_)) => LoadState::Loaded,
            Some(Err(err)) => LoadState::Failed(err.clone()),
            None if self.started.load(Ordering::Acquire) => LoadState::Loading,
            None => LoadState::Unloaded,
        }
    }

    fn load(&self) -> Result<Arc<LibWebp>, LoadError> {
        let (name, library) = self.open_first().inspect_err(|err| warn!("{err}"))?;

        // Safety: the signatures in webp-sys/spec.json follow libwebp's
        // public headers for the compiled-in ABI version.
        let lib = unsafe { LibWebp::load(library) }.map_err(|err| {
            warn!(library = %name, "{err}");
            LoadError::MandatorySymbolMissing {
                symbol: err.symbol,
                reason: err.reason,
            }
        })?;

        for binding in LibWebp::BINDINGS.iter().filter(|b| b.optional) {
            if lib.is_bound(binding.name) == Some(false) {
                debug!(library = %name, symbol = binding.symbol, "optional symbol not exported");
            }
        }
        info!(library = %name, "loaded libwebp");
        Ok(Arc::new(lib))
    }

    fn open_first(&self) -> Result<(&str, Box<dyn NativeLibrary>), LoadError> {
        let mut attempts = Vec::with_capacity(self.candidates.len());
        for name in &self.candidates {
            match self.opener.open(name) {
                Ok(library) => return Ok((name.as_str(), library)),
                Err(cause) => {
                    debug!(candidate = %name, %cause, "failed to open");
                    attempts.push((name.clone(), cause));
                }
            }
        }
        Err(LoadError::LibraryNotFound { attempts })
    }
}

/// Marks a load in progress. Cleared again if the load unwinds, which
/// leaves the outcome unset and the loader retryable.
struct Started<'a>(&'a AtomicBool);

impl<'a> Started<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for Started<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.store(false, Ordering::Release);
        }
    }
}

impl<O> std::fmt::Debug for Loader<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("candidates", &self.candidates)
            .field("loaded", &self.outcome.get().map(|o| o.is_ok()))
            .finish_non_exhaustive()
    }
}
