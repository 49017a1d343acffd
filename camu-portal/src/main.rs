//! camu-portal - command line front end
//!
//! Each subcommand opens one page against the local session store; pages
//! print to stdout, logs go to stderr.

use anyhow::{Context, Result};
use camu_portal::client::SubjectAttendanceQuery;
use camu_portal::models::LoginResponse;
use camu_portal::views::{courses, dashboard, timetable, Selection};
use camu_portal::{
    logout, DomainClient, FileStore, HttpGateway, LoginFlow, Mounted, PortalConfig, Route, SessionStore,
    SnapshotStore, StepStatus, StoreKey,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "camu-portal", version)]
#[command(about = "Student portal for the mycamu college API", long_about = None)]
struct Cli {
    /// Config file (default: OS config dir, camu-portal/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and prefetch dashboard, attendance and timetable data
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CAMU_PASSWORD", hide_env_values = true)]
        password: String,
        /// Device type sent upstream (default from config)
        #[arg(long)]
        dtype: Option<String>,
    },
    /// Show the dashboard
    Dashboard,
    /// Show the weekly timetable
    Timetable,
    /// Browse subjects, chapters and chapter material
    Courses {
        /// Subject id, CmID or subject code
        #[arg(long)]
        subject: Option<String>,
        /// SubChapID of a chapter of the selected subject
        #[arg(long, requires = "subject")]
        chapter: Option<String>,
    },
    /// Attendance detail for one subject, printed as JSON
    Attendance {
        #[arg(long)]
        subject: String,
        /// Attendance types to filter on (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
        #[arg(long)]
        fe: bool,
    },
    /// Forget the stored session
    Logout,
}

struct Portal {
    config: PortalConfig,
    client: DomainClient,
    store: FileStore,
}

impl Portal {
    fn open(config: PortalConfig) -> Result<Self> {
        let store = FileStore::open(&config.store_path)
            .with_context(|| format!("opening session store {}", config.store_path.display()))?;
        let client = DomainClient::new(Arc::new(HttpGateway::new(config.gateway_url.clone())));
        debug!(gateway = %config.gateway_url, store = %store.path().display(), "portal ready");
        Ok(Self { config, client, store })
    }
}

fn print_mounted<T: std::fmt::Display>(mounted: Mounted<T>) -> ExitCode {
    match mounted {
        Mounted::Ready(page) => {
            print!("{page}");
            ExitCode::SUCCESS
        }
        Mounted::Redirect(Route::Login) => {
            eprintln!("Not logged in. Run `camu-portal login --email <EMAIL>` first.");
            ExitCode::FAILURE
        }
        Mounted::Redirect(route) => {
            eprintln!("Redirected to {route}");
            ExitCode::FAILURE
        }
        Mounted::Failed(message) => {
            eprintln!("Error: {message}");
            ExitCode::FAILURE
        }
    }
}

struct Notice {
    message: String,
    fatal: bool,
}

/// What to tell the user about a course selection, if anything.
fn selection_notice(what: &str, key: &str, selection: Selection) -> Option<Notice> {
    let (message, fatal) = match selection {
        Selection::Loaded => return None,
        Selection::NotFound => (format!("No {what} matches {key}"), true),
        Selection::Failed => (format!("warning: {what} {key} could not be loaded"), false),
        Selection::Busy => (format!("warning: {what} {key} skipped, another load was in flight"), false),
    };
    Some(Notice { message, fatal })
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = PortalConfig::load(cli.config.as_deref()).await?;
    let portal = Portal::open(config)?;
    let store: &dyn SessionStore = &portal.store;

    let code = match cli.command {
        Commands::Login { email, password, dtype } => {
            let mut config = portal.config.clone();
            if let Some(dtype) = dtype {
                config.device_type = dtype;
            }
            let outcome = match LoginFlow::new(&portal.client, store, &config).run(&email, &password).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    eprintln!("Error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            };
            for report in &outcome.steps {
                match &report.status {
                    StepStatus::Saved => {}
                    StepStatus::Skipped(why) => eprintln!("note: {} skipped ({why})", report.step),
                    StepStatus::Failed(why) => eprintln!("warning: {} not loaded ({why})", report.step),
                }
            }
            debug!(route = %outcome.route, "login finished");
            print_mounted(dashboard::mount(store))
        }
        Commands::Dashboard => print_mounted(dashboard::mount(store)),
        Commands::Timetable => print_mounted(timetable::mount(&portal.client, store, &portal.config).await),
        Commands::Courses { subject, chapter } => {
            let view = match courses::mount(&portal.client, store, &portal.config).await {
                Mounted::Ready(view) => view,
                other => return Ok(print_mounted(other)),
            };
            if let Some(subject) = subject {
                let selection = view.select_subject(&subject).await;
                if let Some(notice) = selection_notice("subject", &subject, selection) {
                    eprintln!("{}", notice.message);
                    if notice.fatal {
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
            if let Some(chapter) = chapter {
                let selection = view.select_chapter(&chapter).await;
                if let Some(notice) = selection_notice("chapter", &chapter, selection) {
                    eprintln!("{}", notice.message);
                    if notice.fatal {
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
            print!("{view}");
            ExitCode::SUCCESS
        }
        Commands::Attendance { subject, types, fe } => {
            if !store.is_authenticated() {
                return Ok(print_mounted(Mounted::<String>::Redirect(Route::Login)));
            }
            let login = store
                .load::<LoginResponse>(StoreKey::LoginData)
                .context("no login data stored, log in again")?;
            let cm_prog_id = login
                .data()
                .first_progression()
                .and_then(|p| p.cm_prog_id.clone())
                .context("no CmProgID on the stored progression record")?;

            let query = SubjectAttendanceQuery {
                cm_prog_id,
                is_fe: fe,
                attendance_types: types,
                subject_id: subject,
            };
            let session = store.session_token();
            let snapshot = portal.client.attendance_by_subject(session.as_ref(), &query).await?;
            println!("{}", serde_json::to_string_pretty(snapshot.raw())?);
            ExitCode::SUCCESS
        }
        Commands::Logout => {
            let route = logout(store)?;
            println!("Logged out. Next: {route}");
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("camu_portal=warn")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
