fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "linux" {
        panic!(
            "{} only works on linux (x86 and x86_64)",
            env!("CARGO_PKG_NAME")
        );
    }
}
