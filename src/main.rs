use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod archive;
mod cascade;
mod cloudinary;
mod config;
mod credentials;
mod db;
mod decode;
mod error;
mod models;
mod normalize;
mod register;
mod resource;
mod response;
mod store;
mod validate;

use crate::archive::ResumeArchiver;
use crate::cascade::CascadingDeleter;
use crate::cloudinary::CloudinaryStore;
use crate::config::Config;
use crate::db::PgStore;
use crate::decode::FileFormat;
use crate::error::AppError;
use crate::register::BatchRegistrar;
use crate::response::{DeletionResponse, RegistrationResponse, ZipResponse};
use crate::validate::CredentialPolicy;

#[derive(Parser)]
#[command(name = "placement-coordinator")]
#[command(about = "Student registration and company cleanup for placement coordinators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample companies, students and applications
    Seed,
    /// Register students from a CSV or spreadsheet upload
    RegisterStudents {
        #[arg(long)]
        file: PathBuf,
        /// Overrides the format implied by the file extension
        #[arg(long, value_enum)]
        format: Option<FileFormat>,
    },
    /// Delete a company, its applications and their stored resumes
    DeleteCompany {
        #[arg(long)]
        id: Uuid,
    },
    /// Generate a zip download link for stored resumes
    DownloadResumes {
        /// Limit the archive to one company's applicants
        #[arg(long)]
        company: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool.clone());

    let outcome = match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
            return Ok(());
        }
        Commands::Seed => {
            store
                .seed(&CredentialPolicy::new(config.password_suffix.clone()))
                .await?;
            println!("Seed data inserted.");
            return Ok(());
        }
        Commands::RegisterStudents { file, format } => {
            register_students(&file, format, &config, &store).await
        }
        Commands::DeleteCompany { id } => delete_company(id, &config, &store).await,
        Commands::DownloadResumes { company } => {
            download_resumes(company, &config, &store).await
        }
    };

    if let Err(err) = outcome {
        if err.status() >= 500 {
            tracing::error!(error = %err, "request failed");
        }
        eprintln!("{}", serde_json::to_string_pretty(&err.body())?);
        eprintln!("status: {}", err.status());
        std::process::exit(1);
    }

    Ok(())
}

async fn register_students(
    file: &Path,
    format: Option<FileFormat>,
    config: &Config,
    store: &PgStore,
) -> Result<(), AppError> {
    let format = match format {
        Some(format) => format,
        None => FileFormat::from_path(file)?,
    };
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| AppError::UnreadableInput(format!("{}: {e}", file.display())))?;
    let rows = decode::decode(&bytes, format)?;

    let credentials = CredentialPolicy::new(config.password_suffix.clone());
    let report = BatchRegistrar::new(store, &credentials)
        .register_all(&rows)
        .await?;
    print_json(&RegistrationResponse::from(report))
}

async fn delete_company(id: Uuid, config: &Config, store: &PgStore) -> Result<(), AppError> {
    let objects = object_store(config)?;
    let outcome = CascadingDeleter::new(store, &objects, &config.resume_prefix)
        .delete_company_cascade(id)
        .await?;
    print_json(&DeletionResponse::from(outcome))
}

async fn download_resumes(
    company: Option<Uuid>,
    config: &Config,
    store: &PgStore,
) -> Result<(), AppError> {
    let objects = object_store(config)?;
    let archiver = ResumeArchiver::new(store, &objects, &config.resume_prefix);
    let zip_url = match company {
        Some(id) => archiver.company_resumes(id).await?,
        None => archiver.all_resumes().await?,
    };
    print_json(&ZipResponse::new(zip_url))
}

fn object_store(config: &Config) -> Result<CloudinaryStore, AppError> {
    let cloudinary = config.cloudinary.clone().ok_or_else(|| {
        AppError::Config(
            "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set"
                .to_string(),
        )
    })?;
    Ok(CloudinaryStore::new(cloudinary))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
