//! Vinotheca CLI: the `vinotheca` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    support::init_logging(cli.global.verbose);
    let context = support::load_context_or_exit(&cli.global);

    match cli.command {
        Commands::Place { command } => commands::place::run(&context, command),
        Commands::Grape { command } => commands::grape::run(&context, command),
        Commands::Definition { command } => commands::definition::run(&context, command),
        Commands::Rule { command } => commands::rule::run(&context, command),
        Commands::Composition { command } => commands::composition::run(&context, command),
        Commands::Ownership { command } => commands::ownership::run(&context, command),
    }
}
