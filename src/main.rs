use clap::Parser;
use premarket::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
