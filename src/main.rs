//! `sanction-client` command-line entry point.

// std
use std::process::ExitCode;

fn main() -> ExitCode {
	sanction_client::cli::main()
}
