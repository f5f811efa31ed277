use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use aya::{Ebpf, EbpfLoader, include_bytes_aligned};
use log::{debug, info};
use tokio::signal::{self, unix::SignalKind};

const EBPF_BYTES: &[u8] = include_bytes_aligned!(concat!(env!("OUT_DIR"), "/map-populator"));

/// Lifts `RLIMIT_MEMLOCK` so map memory can be pinned on kernels that
/// still charge BPF allocations against it (pre memcg accounting).
pub fn remove_memlock_limit() -> Result<()> {
    let rlim = libc::rlimit {
        rlim_cur: libc::RLIM_INFINITY,
        rlim_max: libc::RLIM_INFINITY,
    };
    let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
    if ret != 0 {
        return Err(io::Error::last_os_error()).context("failed to remove limit on locked memory");
    }
    debug!("RLIMIT_MEMLOCK set to infinity");
    Ok(())
}

/// Loads the eBPF object, from `object` when given, else the embedded one.
pub fn load_object(object: Option<&Path>) -> Result<Ebpf> {
    let mut loader = EbpfLoader::new();
    let bpf = match object {
        Some(path) => {
            info!("loading eBPF object from {}", path.display());
            loader
                .load_file(path)
                .with_context(|| format!("failed to load eBPF object {}", path.display()))?
        }
        None => loader
            .load(EBPF_BYTES)
            .context("failed to load embedded eBPF object")?,
    };
    Ok(bpf)
}

/// Number of possible CPUs, i.e. the slot count of a per-CPU value.
pub fn possible_cpus() -> Result<NonZeroUsize> {
    let n = aya::util::nr_cpus().map_err(|err| anyhow!("failed to read possible cpus: {err:?}"))?;
    NonZeroUsize::new(n).context("kernel reported zero possible cpus")
}

/// Blocks until SIGINT or SIGTERM.
pub async fn wait_for_shutdown() -> Result<()> {
    let mut terminate =
        signal::unix::signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::select! {
        res = signal::ctrl_c() => res.context("failed to wait for ctrl-c")?,
        _ = terminate.recv() => {}
    }
    Ok(())
}
