use clap::Parser;

mod commands;
mod demo;
mod handlers;
mod output;

use commands::Cli;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = handlers::handle_command(cli.command) {
        output::print_error(&err.to_string());
        std::process::exit(1);
    }
}
