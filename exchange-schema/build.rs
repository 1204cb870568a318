use std::env::var;
use std::io::Result;

fn main() -> Result<()> {
    let proto_files = &["proto/service.proto"];
    let proto_folder = "proto";

    let out_dir = var("OUT_DIR").expect("Missing OUT_DIR environment variable");
    let descriptors_path = format!("{}/descriptors.bin", out_dir);

    println!("cargo:rerun-if-changed=proto/service.proto");

    // Clients are schema-driven at runtime, only the server side is generated
    // so tests can stand up in-process doubles of the engine.
    tonic_prost_build::configure()
        .file_descriptor_set_path(descriptors_path)
        .build_client(false)
        .compile_protos(proto_files, &[proto_folder])?;

    Ok(())
}
