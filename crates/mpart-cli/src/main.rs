use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use mpart_common::MpartError;
use mpart_storage::options::{ACCESS_KEY, APP_ID, SECRET_KEY, STORAGE_DIR, TEMP_DIR};
use mpart_storage::{BackendOptions, BackendRegistry, LOCAL_BACKEND, StoreClient};
use serde_json::{Value, json};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;
/// Each part is buffered in memory before it is handed to the backend.
const MAX_PART_SIZE: usize = 512 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "mpart", about = "Multipart uploads against pluggable storage backends")]
struct Cli {
    #[arg(long, default_value = LOCAL_BACKEND)]
    backend: String,

    #[arg(long, default_value = "")]
    region: String,

    #[arg(long)]
    temp_dir: Option<String>,

    #[arg(long)]
    storage_dir: Option<String>,

    #[arg(long)]
    access_key: Option<String>,

    #[arg(long)]
    secret_key: Option<String>,

    #[arg(long)]
    app_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Target {
    #[arg(long)]
    bucket: String,

    #[arg(long)]
    key: String,
}

#[derive(Subcommand)]
enum Command {
    /// Start an upload and print its id.
    Init {
        #[command(flatten)]
        target: Target,
    },
    /// Upload one part from a file.
    UploadPart {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        upload_id: String,
        #[arg(long)]
        part_number: u32,
        #[arg(long)]
        file: PathBuf,
    },
    /// Combine uploaded parts, given as PART_NUMBER=ETAG pairs.
    Complete {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        upload_id: String,
        #[arg(long = "part", value_parser = parse_part)]
        parts: Vec<(u32, String)>,
    },
    /// Split a file into parts and run the whole upload.
    Upload {
        #[command(flatten)]
        target: Target,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_PART_SIZE)]
        part_size: usize,
    },
}

impl Cli {
    fn backend_options(&self) -> BackendOptions {
        let mut options = BackendOptions::new();
        let pairs = [
            (TEMP_DIR, &self.temp_dir),
            (STORAGE_DIR, &self.storage_dir),
            (ACCESS_KEY, &self.access_key),
            (SECRET_KEY, &self.secret_key),
            (APP_ID, &self.app_id),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                options.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        options
    }
}

fn parse_part(raw: &str) -> Result<(u32, String), String> {
    let (number, etag) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PART_NUMBER=ETAG, got {raw:?}"))?;
    let number = number
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid part number {number:?}: {err}"))?;
    Ok((number, etag.trim().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let env_filter = EnvFilter::from_default_env().add_directive("mpart=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = BackendRegistry::with_builtin_backends();
    match run(&cli, &registry).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            println!("{}", serde_json::to_string_pretty(&error_output(&err))?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(cli: &Cli, registry: &BackendRegistry) -> anyhow::Result<Value> {
    let client = configure_backend(cli, registry)?;
    let region = cli.region.as_str();

    let output = match &cli.command {
        Command::Init { target } => {
            let upload_id = client
                .init_multipart_upload(&target.bucket, region, &target.key)
                .await?;
            json!({ "uploadId": upload_id })
        }
        Command::UploadPart {
            target,
            upload_id,
            part_number,
            file,
        } => {
            let body = tokio::fs::read(file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let part = client
                .upload_part(
                    &target.bucket,
                    region,
                    &target.key,
                    upload_id,
                    *part_number,
                    Bytes::from(body),
                )
                .await?;
            serde_json::to_value(part)?
        }
        Command::Complete {
            target,
            upload_id,
            parts,
        } => {
            let parts: HashMap<u32, String> = parts.iter().cloned().collect();
            let done = client
                .complete_multipart_upload(&target.bucket, region, &target.key, upload_id, parts)
                .await?;
            serde_json::to_value(done)?
        }
        Command::Upload {
            target,
            file,
            part_size,
        } => {
            let done = upload_file(client.as_ref(), region, target, file, *part_size).await?;
            serde_json::to_value(done)?
        }
    };
    Ok(output)
}

fn configure_backend(
    cli: &Cli,
    registry: &BackendRegistry,
) -> anyhow::Result<Arc<dyn StoreClient>> {
    registry
        .create(&cli.backend, &cli.backend_options())
        .with_context(|| {
            format!(
                "failed to configure backend {} (available: {})",
                cli.backend,
                registry.names().join(", ")
            )
        })
}

/// JSON error envelope; the code comes from the first `MpartError` in the
/// cause chain.
fn error_output(err: &anyhow::Error) -> Value {
    let code = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<MpartError>())
        .map_or("InternalError", MpartError::error_code);
    json!({
        "error": {
            "code": code,
            "message": format!("{err:#}"),
        }
    })
}

fn check_part_size(part_size: usize) -> anyhow::Result<()> {
    if part_size == 0 {
        bail!("--part-size must be greater than zero");
    }
    if part_size > MAX_PART_SIZE {
        bail!("--part-size must not exceed {MAX_PART_SIZE} bytes, got {part_size}");
    }
    Ok(())
}

fn next_part_number(current: u32) -> anyhow::Result<u32> {
    let Some(next) = current.checked_add(1) else {
        bail!("file needs more than {} parts", u32::MAX);
    };
    Ok(next)
}

async fn upload_file(
    client: &dyn StoreClient,
    region: &str,
    target: &Target,
    file: &Path,
    part_size: usize,
) -> anyhow::Result<mpart_common::CompletedUpload> {
    check_part_size(part_size)?;

    let mut reader = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("failed to open {}", file.display()))?;
    let upload_id = client
        .init_multipart_upload(&target.bucket, region, &target.key)
        .await?;

    let mut parts = HashMap::new();
    let mut part_number = 0u32;
    loop {
        let chunk = read_chunk(&mut reader, part_size).await?;
        if chunk.is_empty() {
            break;
        }
        part_number = next_part_number(part_number)?;
        let part = client
            .upload_part(
                &target.bucket,
                region,
                &target.key,
                &upload_id,
                part_number,
                Bytes::from(chunk),
            )
            .await?;
        parts.insert(part.part_number, part.etag);
    }

    info!(
        bucket = %target.bucket,
        key = %target.key,
        parts = parts.len(),
        "all parts uploaded, completing"
    );
    let done = client
        .complete_multipart_upload(&target.bucket, region, &target.key, &upload_id, parts)
        .await?;
    Ok(done)
}

/// Fills up to `size` bytes, returning fewer only at end of file.
async fn read_chunk(reader: &mut tokio::fs::File, size: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; size];
    let mut filled = 0;
    while filled < size {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    buf.truncate(filled);
    Ok(buf)
}
