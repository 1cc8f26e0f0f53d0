fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Ensure a protoc binary is available in environments that don't ship one.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(protoc) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", protoc);
        }
    }
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .compile_protos(&["proto/wellness.proto"], &["proto"])?;
    Ok(())
}
