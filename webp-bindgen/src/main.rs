// SPDX-FileCopyrightText: 2025 Contributors to the webp-rs project.
// SPDX-License-Identifier: Apache-2.0

//! Command-line entry point for offline generation.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use webp_bindgen::{IrJsonTemplate, RustTemplate, Template};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emit {
    /// Rust source.
    Rust,
    /// The intermediate representation as JSON.
    Ir,
}

#[derive(Debug, Parser)]
#[command(version, about = "Generates typed libwebp bindings from function descriptors")]
struct Opts {
    /// JSON file listing the functions to bind.
    #[arg(long)]
    spec: PathBuf,

    /// Output file. Writes to stdout when absent.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Name of the generated library struct.
    #[arg(long, default_value = "LibWebp")]
    struct_name: String,

    /// Path of the module providing `NativeLibrary`, `SymbolError` and `BindingInfo`.
    #[arg(long, default_value = "crate")]
    runtime_path: String,

    #[arg(long, value_enum, default_value_t = Emit::Rust)]
    emit: Emit,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    if let Err(err) = run(&opts) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(opts: &Opts) -> Result<(), Box<dyn std::error::Error>> {
    let template: Box<dyn Template> = match opts.emit {
        Emit::Rust => Box::new(RustTemplate::new().runtime_path(opts.runtime_path.clone())),
        Emit::Ir => Box::new(IrJsonTemplate),
    };

    let bindings = webp_bindgen::builder()
        .spec_file(&opts.spec)
        .library_struct(opts.struct_name.clone())
        .generate_with(template.as_ref())?;

    match &opts.out {
        Some(path) => {
            bindings.write_to_file(path)?;
            tracing::info!(
                "generated {} bindings into {}",
                bindings.unit().bindings.len(),
                path.display()
            );
        }
        None => print!("{bindings}"),
    }
    Ok(())
}
