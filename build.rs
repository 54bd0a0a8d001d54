use std::time::{SystemTime, UNIX_EPOCH};

fn emit_build_version() {
    let n = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let version = env!("CARGO_PKG_VERSION");
    println!("cargo:rustc-env=SELLER_BUILD_N={n}");
    println!("cargo:rustc-env=SELLER_DISPLAY_VERSION={version}+{n}");
}

fn main() {
    emit_build_version();
}
