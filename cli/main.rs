use clap::Parser;

#[macro_use]
mod print;

mod commands;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log every handle and socket lifecycle event.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: commands::Command,
}

fn main() {
    let args = Cli::parse();
    sysshim::log::init_with_level(if args.verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Warn
    });

    if let Err(err) = commands::run_command(args.command) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
