// Stock aya-template build script: compiles the eBPF crate for the bpf target
// and leaves the object at `$OUT_DIR/map-populator` for `include_bytes_aligned!`.

use anyhow::{Context as _, Result, anyhow};
use aya_build::{Package, Toolchain};
use cargo_metadata::{Metadata, MetadataCommand};

const EBPF_PACKAGE: &str = "map-populator-ebpf";

fn main() -> Result<()> {
    let metadata = MetadataCommand::new()
        .no_deps()
        .exec()
        .context("MetadataCommand::exec")?;
    let root_dir = ebpf_root_dir(&metadata)?;
    let ebpf_package = Package {
        name: EBPF_PACKAGE,
        root_dir: &root_dir,
        ..Default::default()
    };
    aya_build::build_ebpf([ebpf_package], Toolchain::default())
}

/// Directory holding the eBPF crate's manifest.
fn ebpf_root_dir(metadata: &Metadata) -> Result<String> {
    let package = metadata
        .packages
        .iter()
        .find(|package| package.name.as_str() == EBPF_PACKAGE)
        .ok_or_else(|| anyhow!("{EBPF_PACKAGE} package not found"))?;
    let manifest_path = &package.manifest_path;
    let root = manifest_path
        .parent()
        .ok_or_else(|| anyhow!("no parent for {manifest_path}"))?;
    Ok(root.as_str().to_owned())
}
