//! `tuckr` command-line entry point.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser as _;
use tuckr_cli::cli::{Cli, Command};
use tuckr_cli::commands::{self, CommandSetup};
use tuckr_cli::error;
use tuckr_cli::interrupt::Interrupt;
use tuckr_cli::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    logging::init_subscriber(args.verbose, args.command.name());
    let log = Arc::new(Logger::new(args.command.name()));

    let interrupt = Interrupt::new();
    if let Err(e) = interrupt.install() {
        log.debug(&format!("{e:#}"));
    }
    let setup = CommandSetup::system(interrupt);

    match dispatch(&args, &setup, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::from(error::return_code(&e))
        }
    }
}

fn dispatch(args: &Cli, setup: &CommandSetup, log: &Arc<Logger>) -> Result<()> {
    let global = &args.global;
    match &args.command {
        Command::Add(opts) => commands::add::run(global, opts, setup, log),
        Command::Rm(opts) => commands::add::run_remove(global, opts, setup, log),
        Command::Set(opts) => commands::set::run(global, opts, setup, log),
        Command::Unset(opts) => commands::set::run_unset(global, opts, setup, log),
        Command::Status(opts) => commands::status::run(global, opts, setup, log),
        Command::Encrypt(opts) => commands::secrets::run_encrypt(global, opts, setup, log),
        Command::Decrypt(opts) => commands::secrets::run_decrypt(global, opts, setup, log),
        Command::Push(opts) => commands::files::run_push(global, opts, setup, log),
        Command::Pop(opts) => commands::files::run_pop(global, opts, setup, log),
        Command::Ls(opts) => commands::list::run(global, opts, setup, log),
        Command::Init => commands::files::run_init(global, setup, log),
        Command::Groupis(opts) => commands::files::run_groupis(global, opts, setup, log),
        Command::Completions(opts) => commands::completions::run(opts),
        Command::Version => commands::version::run(),
    }
}
