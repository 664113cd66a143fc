use anyhow::Result;
use clap::Subcommand;

mod cat;
mod isatty;
mod pair;
mod strerror;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Copy files to standard output.
    Cat(cat::Args),
    /// Tell whether a descriptor refers to a terminal.
    Isatty(isatty::Args),
    /// Echo a message through a connected socket pair.
    Pair(pair::Args),
    /// Describe an errno value.
    Strerror(strerror::Args),
}

pub fn run_command(command: Command) -> Result<()> {
    match command {
        Command::Cat(args) => cat::main(args),
        Command::Isatty(args) => isatty::main(args),
        Command::Pair(args) => pair::main(args),
        Command::Strerror(args) => strerror::main(args),
    }
}
