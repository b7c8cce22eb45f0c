// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Generates `env_names.rs`, the environment variable names the agent reads.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// (name, doc) for every variable the agent consults.
const VARIABLES: &[(&str, &str)] = &[
    ("ASSETD_TELEMETRY_ROOT", "directory served to clients by the telemetry collector"),
    ("RUST_LOG", "log level filter (read by tracing-subscriber)"),
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let Ok(out_dir) = env::var("OUT_DIR") else {
        eprintln!("cargo:warning=OUT_DIR not set");
        std::process::exit(1);
    };
    if let Err(e) = write_names(&Path::new(&out_dir).join("env_names.rs")) {
        eprintln!("cargo:warning=failed to write env_names.rs: {e}");
        std::process::exit(1);
    }
}

fn write_names(dest: &Path) -> io::Result<()> {
    let mut file = fs::File::create(dest)?;
    for (name, doc) in VARIABLES {
        writeln!(file, "/// Environment variable: {doc}.")?;
        writeln!(file, "pub const {name}: &str = \"{name}\";")?;
        writeln!(file)?;
    }
    Ok(())
}
