use std::path::PathBuf;

fn main() {
    let build_rknn = std::env::var("CARGO_FEATURE_RKNN_BACKEND").is_ok();

    println!("cargo:rerun-if-env-changed=RKNN_LIB_DIR");
    println!("cargo:rerun-if-env-changed=RKNN_LIB_NAME");

    if build_rknn {
        // librknn_api.so on RK1808/RV1109 boards; librknnrt.so on RK356x/RK3588
        let lib_name = std::env::var("RKNN_LIB_NAME").unwrap_or_else(|_| "rknn_api".to_string());

        let mut lib_dir = PathBuf::from(
            std::env::var("RKNN_LIB_DIR").unwrap_or_else(|_| "/usr/lib".to_string()),
        );
        if !lib_dir.join(format!("lib{lib_name}.so")).exists() {
            let fallback = lib_dir.join("aarch64-linux-gnu");
            if fallback.exists() {
                lib_dir = fallback;
            }
        }

        println!("cargo:rustc-link-search=native={}", lib_dir.display());
        println!("cargo:rustc-link-lib=dylib={lib_name}");
        println!("cargo:rerun-if-changed=src/backend/rknn/sys.rs");
    }
}
