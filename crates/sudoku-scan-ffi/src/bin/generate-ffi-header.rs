//! Writes `include/sudoku_scan.h` for the C ABI.
//!
//! Run with `--features generate-header`; an optional argument overrides the
//! output path.

use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let out = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| crate_dir.join("include").join("sudoku_scan.h"));
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("SUDOKU_SCAN_H".to_string()),
        cpp_compat: true,
        usize_is_size_t: true,
        ..cbindgen::Config::default()
    };

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()?
        .write_to_file(&out);
    println!("wrote {}", out.display());
    Ok(())
}
