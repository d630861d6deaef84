//! Build script for the storefront crate.
//!
//! Fingerprints `static/css/main.css` so templates can reference a
//! content-addressed stylesheet that is safe to cache forever.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    fingerprint_stylesheet();
}

/// Set `CSS_HASH` and write `static/css/derived/main.<hash>.css`.
fn fingerprint_stylesheet() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let source = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", source.display());

    let Ok(content) = fs::read(&source) else {
        println!("cargo:warning=main.css not found, serving unhashed stylesheet");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short = digest.get(..8).unwrap_or(&digest);
    println!("cargo:rustc-env=CSS_HASH={short}");

    let derived = Path::new(&manifest_dir).join("static/css/derived");
    fs::create_dir_all(&derived).expect("Failed to create derived CSS directory");
    fs::copy(&source, derived.join(format!("main.{short}.css")))
        .expect("Failed to copy fingerprinted CSS");
}
