mod account;
mod auth;
mod cli;
mod error;
mod export;
mod filter;
mod fmt;
mod models;
mod months;
mod print;
mod reports;
mod settings;
mod store;
mod validation;
mod view;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ExportCommands, UsersCommands};

fn init_tracing() {
    let fallback = settings::load_settings().log_level;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Register { email } => cli::session::register(&email),
        Commands::Login { email } => cli::session::login(&email),
        Commands::Logout => cli::session::logout(),
        Commands::Whoami => cli::session::whoami(),
        Commands::Submit { kind, file } => cli::submit::submit(kind, &file),
        Commands::Edit { kind, id, file } => cli::submit::update(kind, &id, &file),
        Commands::Delete { kind, id } => cli::submit::delete(kind, &id),
        Commands::Mine { kind } => cli::submit::mine(kind),
        Commands::Report {
            kind,
            filter,
            combined,
        } => cli::report::run(kind, filter.filter(), combined),
        Commands::Periods { kind, year } => cli::report::periods(kind, year),
        Commands::Months { since } => cli::report::months(since),
        Commands::Overview => cli::dashboard::overview(),
        Commands::Dashboard { year, month } => cli::dashboard::run(year, month),
        Commands::Export { command } => match command {
            ExportCommands::Csv {
                target,
                filter,
                output,
            } => cli::export::csv(target, filter.filter(), output),
            ExportCommands::Print {
                kind,
                filter,
                charts,
                output,
                open,
            } => cli::export::print(kind, filter.filter(), charts, output, open),
        },
        Commands::Users { command } => match command {
            UsersCommands::List => cli::users::list(),
            UsersCommands::Approve { uid } => cli::users::approve(&uid),
            UsersCommands::Revoke { uid } => cli::users::revoke(&uid),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
