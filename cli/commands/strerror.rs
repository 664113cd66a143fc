use anyhow::Result;
use clap::Parser;
use sysshim::error::Error;

#[derive(Parser, Debug)]
pub struct Args {
    /// The errno value; -1 stands for "no defined code".
    #[arg(allow_hyphen_values = true)]
    code: i32,

    /// Print the error as JSON.
    #[arg(long)]
    json: bool,
}

fn render(args: &Args) -> Result<String> {
    let err = Error::new(args.code);
    if args.json {
        Ok(serde_json::to_string(&err)?)
    } else {
        Ok(err.to_string())
    }
}

pub fn main(args: Args) -> Result<()> {
    println!("{}", render(&args)?);
    Ok(())
}
