use std::ffi::CString;
use std::io;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use sysshim::handle::OwnedHandle;

#[derive(Parser, Debug)]
pub struct Args {
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

fn copy_file(path: &Path, out: &mut impl Write) -> Result<u64> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .with_context(|| format!("{} contains a NUL byte", path.display()))?;
    let mut file = OwnedHandle::open(&c_path, libc::O_RDONLY | libc::O_CLOEXEC)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let copied = io::copy(&mut file, out)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(copied)
}

pub fn main(args: Args) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in &args.paths {
        let copied = copy_file(path, &mut out)?;
        log::debug!("copied {} bytes from {}", copied, path.display());
    }

    out.flush()?;
    Ok(())
}
