//! # lumascan: resume analysis from the terminal
//!
//! Uploads PDF resumes for skill extraction, scores them against job descriptions,
//! and manages the resumes saved to a signed-in account.

mod app;
mod auth;
mod config;
mod files;
mod shell;
mod state_manager;
mod ui;

use anyhow::{Context, Result};
use app::{App, AuthState};
use clap::{Parser, Subcommand};
use colored::Colorize;
use lumascan::providers::auth::SignUpOutcome;
use state_manager::StateManager;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a YAML configuration file (defaults to ./lumascan.yml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a PDF resume and show the extracted skills
    Upload(UploadArgs),
    /// Score a resume against a job description
    Match(MatchArgs),
    /// Ask the analysis service to tailor a resume to a job description
    Rewrite(RewriteArgs),
    /// Check that the analysis service is reachable
    Health,
    /// Sign up, sign in and out, or reset a password
    Auth(AuthArgs),
    /// List, show and delete saved resumes
    Resumes(ResumesArgs),
    /// Start an interactive shell; drop PDF files into it to upload them
    Shell,
}

#[derive(Parser, Debug)]
struct UploadArgs {
    /// The resume to upload
    file: PathBuf,
    /// Print only the extracted skills
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Parser, Debug)]
struct MatchArgs {
    /// The job description text
    #[arg(long, conflicts_with = "job_file", required_unless_present = "job_file")]
    job: Option<String>,
    /// Read the job description from a file
    #[arg(long)]
    job_file: Option<PathBuf>,
    /// Industry hint for the analysis (e.g. tech, finance)
    #[arg(long)]
    industry: Option<String>,
    /// Upload this resume first instead of using the last uploaded one
    #[arg(long)]
    resume: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RewriteArgs {
    /// The resume to rewrite
    file: PathBuf,
    /// Read the job description from a file
    #[arg(long)]
    job_file: PathBuf,
    /// Where to write the rewritten PDF
    #[arg(long, short)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AuthArgs {
    #[command(subcommand)]
    command: AuthCommands,
}

#[derive(Parser, Debug)]
struct Credentials {
    email: String,
    #[arg(long, env = "LUMASCAN_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum AuthCommands {
    /// Create an account
    Signup(Credentials),
    /// Sign in with email and password
    Login(Credentials),
    /// Sign in through a provider in the browser
    Oauth {
        #[arg(long, default_value = "github")]
        provider: String,
    },
    /// Sign out and forget the local session
    Logout,
    /// Send a password reset email
    Reset { email: String },
    /// Show who is signed in
    Status,
}

#[derive(Parser, Debug)]
struct ResumesArgs {
    #[command(subcommand)]
    command: ResumesCommands,
}

#[derive(Subcommand, Debug)]
enum ResumesCommands {
    /// List saved resumes, newest first
    List,
    /// Show one saved resume
    Show { id: String },
    /// Delete a saved resume
    Delete { id: String },
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(state: &StateManager) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(state.log_path())?;
    let subscriber = fmt::Subscriber::builder()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::get_config(cli.config.as_deref())?;
    let state = StateManager::open(config.state_dir())?;
    init_logging(&state)?;
    info!("Running {:?}", cli.command);

    let app = App::new(config, state).await?;
    match cli.command {
        Commands::Upload(args) => handle_upload(&app, &args).await,
        Commands::Match(args) => handle_match(&app, &args).await,
        Commands::Rewrite(args) => handle_rewrite(&app, &args).await,
        Commands::Health => handle_health(&app).await,
        Commands::Auth(args) => handle_auth(&app, args.command).await,
        Commands::Resumes(args) => handle_resumes(&app, args.command).await,
        Commands::Shell => shell::run_shell(&app).await,
    }
}

// --- Command Handlers ---

fn print_save_warning(app: &App) {
    if let Some(message) = app.workflow.view().save_error {
        eprintln!("{}", ui::save_warning(&message));
    }
}

fn read_job_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read job description from '{}'", path.display()))
}

async fn handle_upload(app: &App, args: &UploadArgs) -> Result<()> {
    let view = app.upload(&args.file).await?;
    print!("{}", ui::upload(&view, args.quiet));
    print_save_warning(app);
    Ok(())
}

async fn handle_match(app: &App, args: &MatchArgs) -> Result<()> {
    match &args.resume {
        Some(path) => {
            app.upload(path).await?;
        }
        None => {
            app.restore_last_resume()?;
        }
    }

    let job_desc = match (&args.job, &args.job_file) {
        (Some(job), _) => job.clone(),
        (None, Some(path)) => read_job_file(path)?,
        (None, None) => String::new(),
    };

    let result = app.analyze(&job_desc, args.industry.as_deref()).await?;
    print!("{}", ui::match_report(&result));
    print_save_warning(app);
    Ok(())
}

async fn handle_rewrite(app: &App, args: &RewriteArgs) -> Result<()> {
    let file = files::read_resume_file(&args.file)?;
    if !file.is_pdf() {
        anyhow::bail!(lumascan::constants::NOT_PDF_MESSAGE);
    }
    let job_description = read_job_file(&args.job_file)?;

    let pdf = app.analysis().rewrite_resume(&file, &job_description).await?;
    fs::write(&args.out, &pdf)
        .with_context(|| format!("Failed to write '{}'", args.out.display()))?;
    println!("Wrote rewritten resume to {}", args.out.display());
    Ok(())
}

async fn handle_health(app: &App) -> Result<()> {
    let status = app.analysis().health().await?;
    println!("{} is {status}", app.config.api_url);
    Ok(())
}

async fn handle_auth(app: &App, command: AuthCommands) -> Result<()> {
    match command {
        AuthCommands::Signup(credentials) => {
            match app.sign_up(&credentials.email, &credentials.password).await? {
                SignUpOutcome::SignedIn(_) => {
                    println!("✅ Account created; signed in as {}.", credentials.email)
                }
                SignUpOutcome::ConfirmationRequired { email } => println!(
                    "Check {email} for a confirmation link, then run `lumascan auth login`."
                ),
            }
        }
        AuthCommands::Login(credentials) => {
            app.sign_in(&credentials.email, &credentials.password).await?;
            println!("✅ Signed in as {}.", credentials.email);
        }
        AuthCommands::Oauth { provider } => {
            let session = app.sign_in_with_provider(&provider).await?;
            let who = session.user.email.unwrap_or(session.user.id);
            println!("✅ Signed in as {who}.");
        }
        AuthCommands::Logout => {
            app.sign_out().await?;
            println!("Signed out.");
        }
        AuthCommands::Reset { email } => {
            app.send_password_reset(&email).await?;
            println!("If an account exists for {email}, a reset link is on its way.");
        }
        AuthCommands::Status => match app.auth_state() {
            AuthState::Authenticated { email } => println!(
                "Signed in as {}.",
                email.as_deref().unwrap_or("an account without email")
            ),
            AuthState::Guest => println!("Not signed in. Results are not saved."),
        },
    }
    Ok(())
}

async fn handle_resumes(app: &App, command: ResumesCommands) -> Result<()> {
    if app.auth_state() == AuthState::Guest {
        anyhow::bail!("Sign in to see saved resumes: `lumascan auth login <EMAIL>`.");
    }
    app.dashboard.fetch().await?;

    match command {
        ResumesCommands::List => print!("{}", ui::record_list(&app.dashboard.records())),
        ResumesCommands::Show { id } => {
            let record = app.open_record(&id)?;
            print!("{}", ui::record_detail(&record));
        }
        ResumesCommands::Delete { id } => {
            if app.dashboard.select(&id).is_none() {
                anyhow::bail!("No saved resume with id '{id}'.");
            }
            app.dashboard.delete(&id).await?;
            println!("Deleted {id}.");
        }
    }
    Ok(())
}
