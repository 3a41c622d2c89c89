fn main() -> Result<(), Box<dyn std::error::Error>> {
    export_version();
    println!("cargo:rerun-if-env-changed=DATE");
    Ok(())
}

/// Exposes `FULL_VERSION` (package version, optional build date and git hash)
/// to the crate so the presenter can log what it is running.
fn export_version() {
    let base = env!("CARGO_PKG_VERSION");
    let pkg_version = match std::env::var("DATE") {
        Ok(date) => format!("{}.{}", base, date),
        Err(_) => base.to_string(),
    };

    let version = versionisator::Version::new(
        env!("CARGO_MANIFEST_DIR"),
        env!("CARGO_PKG_NAME").to_string(),
        pkg_version,
    );

    println!("cargo:rustc-env=FULL_VERSION={}", version.full());
    println!("cargo:rustc-env=SOURCE_VERSION={}", version.hash());
}
