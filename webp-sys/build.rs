// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Build script for the `webp-sys` FFI crate.
//!
//! Runs `webp-bindgen` over `spec.json` and writes the generated library
//! struct to `OUT_DIR/bindings.rs`. Nothing is linked at build time: every
//! symbol is resolved when the library is loaded at runtime.

use std::env;
use std::path::PathBuf;

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("failed to get current directory"));
    let spec = manifest_dir.join("spec.json");
    println!("cargo:rerun-if-changed={}", spec.display());

    let bindings = webp_bindgen::builder()
        .spec_file(spec)
        .library_struct("LibWebp")
        .generate()
        .unwrap();

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Could not write bindings");
}
