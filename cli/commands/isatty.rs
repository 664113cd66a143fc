use anyhow::Result;
use clap::Parser;
use sysshim::handle::HandleId;
use sysshim::unistd;

#[derive(Parser, Debug)]
pub struct Args {
    /// Descriptor to test.
    #[arg(default_value_t = 0)]
    fd: i32,
}

fn describe(fd: HandleId) -> Result<String> {
    if !unistd::isatty(fd)? {
        return Ok(format!("{}: not a terminal", fd));
    }

    let name = unistd::ttyname(fd)?;
    Ok(format!("{}: {}", fd, name.to_string_lossy()))
}

pub fn main(args: Args) -> Result<()> {
    println!("{}", describe(HandleId::from_raw(args.fd))?);
    Ok(())
}
