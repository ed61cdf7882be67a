pub mod dashboard;
pub mod export;
pub mod init;
pub mod report;
pub mod session;
pub mod submit;
pub mod users;

use clap::{Parser, Subcommand};

use crate::account::{self, Route};
use crate::auth::LocalIdentity;
use crate::error::{ReportError, Result};
use crate::filter::Filter;
use crate::models::{ReportKind, User};
use crate::months::MonthKey;
use crate::settings::{load_settings, Settings};
use crate::store::{init_db, SqliteStore};

pub const PASSWORD_ENV: &str = "RAPORLAMA_PASSWORD";
pub const PASSWORD_CONFIRM_ENV: &str = "RAPORLAMA_PASSWORD_CONFIRM";
pub const BROWSER_ENV: &str = "RAPORLAMA_BROWSER";

/// Open settings and the database for a command.
pub(crate) struct Context {
    pub settings: Settings,
    pub store: SqliteStore,
}

impl Context {
    pub fn open() -> Result<Self> {
        let settings = load_settings();
        let db_path = settings.db_path();
        if !db_path.exists() {
            return Err(ReportError::Other(
                "Veritabanı bulunamadı. Önce `raporlama init` çalıştırın.".to_string(),
            ));
        }
        let store = SqliteStore::open(&db_path)?;
        init_db(store.conn())?;
        Ok(Self { settings, store })
    }

    pub fn identity(&self) -> LocalIdentity<'_> {
        LocalIdentity::new(self.store.conn())
    }

    /// The signed-in user, if `route` admits them.
    pub fn require(&self, route: Route) -> Result<User> {
        account::require(&self.store, &self.identity(), route)
    }
}

/// Password from the environment for scripted use, else an interactive prompt.
/// Callers zeroize the returned value.
pub(crate) fn read_password(prompt: &str, env_key: &str) -> Result<String> {
    if let Ok(from_env) = std::env::var(env_key) {
        return Ok(from_env);
    }
    Ok(rpassword::prompt_password(prompt)?)
}

pub(crate) fn read_confirmation(password: &str) -> Result<String> {
    if let Ok(confirm) = std::env::var(PASSWORD_CONFIRM_ENV) {
        return Ok(confirm);
    }
    // scripted runs give the password once
    if std::env::var(PASSWORD_ENV).is_ok() {
        return Ok(password.to_string());
    }
    read_password("Şifre (tekrar): ", PASSWORD_CONFIRM_ENV)
}

pub(crate) fn build_filter(year: Option<String>, month: Option<String>, platform: Option<String>) -> Filter {
    Filter::from_options(year.as_deref(), month.as_deref(), platform.as_deref())
}

fn parse_kind(s: &str) -> std::result::Result<ReportKind, String> {
    s.parse()
}

/// `YYYY` or `all`.
fn parse_year(s: &str) -> std::result::Result<String, String> {
    let v = s.trim();
    if v.eq_ignore_ascii_case("all") || (v.len() == 4 && v.bytes().all(|b| b.is_ascii_digit())) {
        Ok(v.to_string())
    } else {
        Err(format!("invalid year '{s}', expected YYYY or 'all'"))
    }
}

/// `YYYY-MM` or `all`.
fn parse_month(s: &str) -> std::result::Result<String, String> {
    let v = s.trim();
    if v.eq_ignore_ascii_case("all") {
        return Ok(v.to_string());
    }
    v.parse::<MonthKey>().map(|key| key.code())
}

/// `all` or a single report kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    All,
    Kind(ReportKind),
}

fn parse_target(s: &str) -> std::result::Result<ExportTarget, String> {
    if s.eq_ignore_ascii_case("all") {
        Ok(ExportTarget::All)
    } else {
        s.parse().map(ExportTarget::Kind)
    }
}

#[derive(Parser)]
#[command(
    name = "raporlama",
    version,
    about = "Monthly activity reports for the corporate communications department."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Year (YYYY) or 'all'
    #[arg(long, value_parser = parse_year)]
    pub year: Option<String>,
    /// Month (YYYY-MM) or 'all'
    #[arg(long, value_parser = parse_month)]
    pub month: Option<String>,
    /// Social media platform (X, Instagram, ...) or 'all'
    #[arg(long)]
    pub platform: Option<String>,
}

impl FilterArgs {
    pub fn filter(&self) -> Filter {
        build_filter(self.year.clone(), self.month.clone(), self.platform.clone())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and create the database.
    Init {
        /// Path for report data (default: ~/Documents/raporlama)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Create an account. New accounts wait for admin approval.
    Register {
        email: String,
    },
    /// Sign in.
    Login {
        email: String,
    },
    /// Sign out.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// Submit a monthly report from a JSON file.
    Submit {
        /// news, social-media, web-analytics, cimer, rpa
        #[arg(value_parser = parse_kind)]
        kind: ReportKind,
        /// JSON body; `month` (YYYY-MM) is required
        file: String,
    },
    /// Update fields of an existing report from a JSON file.
    Edit {
        #[arg(value_parser = parse_kind)]
        kind: ReportKind,
        id: String,
        file: String,
    },
    /// Delete one of your reports.
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: ReportKind,
        id: String,
    },
    /// List your own submissions.
    Mine {
        #[arg(value_parser = parse_kind)]
        kind: ReportKind,
    },
    /// Category report: monthly series, rates and rankings.
    Report {
        #[arg(value_parser = parse_kind)]
        kind: ReportKind,
        #[command(flatten)]
        filter: FilterArgs,
        /// Social media: one row per month instead of per platform
        #[arg(long)]
        combined: bool,
    },
    /// Years and months that have data.
    Periods {
        #[arg(value_parser = parse_kind)]
        kind: ReportKind,
        #[arg(long, value_parser = parse_year)]
        year: Option<String>,
    },
    /// Month codes that can be entered on a report, newest first.
    Months {
        /// First year to list (default: last year)
        #[arg(long)]
        since: Option<i32>,
    },
    /// Record counts per category and the recent monthly trend.
    Overview,
    /// Headline totals for a year or month.
    Dashboard {
        #[arg(long, value_parser = parse_year)]
        year: Option<String>,
        #[arg(long, value_parser = parse_month)]
        month: Option<String>,
    },
    /// Export reports.
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Approve or revoke staff accounts.
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Write a CSV file for one category or 'all'.
    Csv {
        #[arg(value_parser = parse_target)]
        target: ExportTarget,
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file path
        #[arg(long)]
        output: Option<String>,
    },
    /// Write a print-ready HTML document and optionally open it for printing.
    Print {
        #[arg(value_parser = parse_kind)]
        kind: ReportKind,
        #[command(flatten)]
        filter: FilterArgs,
        /// Directory holding rendered charts named <kind>-chart.svg or .html
        #[arg(long)]
        charts: Option<String>,
        /// Output file path
        #[arg(long)]
        output: Option<String>,
        /// Open the document in the browser to print
        #[arg(long)]
        open: bool,
    },
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List staff accounts.
    List,
    /// Approve a staff account.
    Approve {
        uid: String,
    },
    /// Withdraw approval.
    Revoke {
        uid: String,
    },
}
