use clap::Parser;
use treesort::cli::{self, Args};

fn main() {
    let args = Args::parse();
    std::process::exit(cli::run(args));
}
