use std::io::Read;
use std::io::Write;

use anyhow::Result;
use clap::Parser;
use sysshim::socket::Socket;

#[derive(Parser, Debug)]
pub struct Args {
    message: String,
}

fn echo(message: &str) -> Result<String> {
    let (near, far) = Socket::pair(libc::AF_UNIX, libc::SOCK_STREAM, 0)?;
    log::debug!("socket pair: {} <-> {}", near.id(), far.id());

    (&near).write_all(message.as_bytes())?;
    near.shutdown(libc::SHUT_WR)?;

    let mut received = String::new();
    (&far).read_to_string(&mut received)?;
    Ok(received)
}

pub fn main(args: Args) -> Result<()> {
    println!("{}", echo(&args.message)?);
    Ok(())
}
