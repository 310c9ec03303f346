fn main() {
    // Only the desktop shell needs the generated context and capability
    // schemas; the core library builds without Tauri.
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
