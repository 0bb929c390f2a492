//! File CLI commands: listings, uploads and single-file operations.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use grutto_core::error::AppError;
use grutto_core::types::FileSort;
use grutto_entity::file::{File, FileKind};
use grutto_service::RequestContext;
use grutto_service::file::{
    FileEntry, FileQuery, FileView, UploadCandidate, UploadEvent, UploadOptions,
};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// List files in a view
    List {
        /// recent, owned, shared, folder, favorites or trash
        #[arg(short, long, default_value = "recent")]
        view: FileView,
        /// Folder ID for the folder view
        #[arg(long)]
        folder: Option<String>,
        /// Match against name, type and uploader
        #[arg(short, long)]
        search: Option<String>,
        /// pdf, word, excel, powerpoint, image or document
        #[arg(short, long)]
        kind: Option<FileKind>,
        /// name or date
        #[arg(long)]
        sort: Option<FileSort>,
    },
    /// Upload one or more files
    Upload {
        /// Local paths
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Target folder ID
        #[arg(long)]
        folder: Option<String>,
        /// MIME type for files whose extension is not recognised
        #[arg(long)]
        mime: Option<String>,
    },
    /// Show one file
    Get {
        /// File ID
        id: String,
    },
    /// Rename a file
    Rename {
        /// File ID
        id: String,
        /// New name
        name: String,
    },
    /// Move a file into a folder, or to root with `root`
    Move {
        /// File ID
        id: String,
        /// Folder ID or `root`
        folder: String,
    },
    /// Save a file's contents locally
    Download {
        /// File ID
        id: String,
        /// Output path (defaults to the file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Issue a short-lived viewer URL
    Url {
        /// File ID
        id: String,
    },
    /// Mark or unmark a file as favorite
    Favorite {
        /// File ID
        id: String,
        /// Remove the mark instead of setting it
        #[arg(long)]
        off: bool,
    },
}

/// File display row
#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    /// File ID
    id: String,
    /// Name
    name: String,
    /// Category
    kind: String,
    /// Size
    size: String,
    /// Uploader
    uploader: String,
    /// Favorite marker
    #[tabled(rename = "★")]
    favorite: String,
    /// Upload date
    uploaded: String,
}

impl FileRow {
    fn new(file: &File, uploader: &str) -> Self {
        Self {
            id: file.id.to_string(),
            name: file.filename.clone(),
            kind: file.kind().to_string(),
            size: output::human_bytes(file.file_size),
            uploader: uploader.to_string(),
            favorite: if file.is_favorite { "★" } else { "" }.to_string(),
            uploaded: output::short_time(&file.upload_date),
        }
    }
}

impl From<&FileEntry> for FileRow {
    fn from(entry: &FileEntry) -> Self {
        let uploader = entry
            .uploader
            .as_ref()
            .map(|u| u.display_name.clone().unwrap_or_else(|| u.username.clone()))
            .unwrap_or_default();
        Self::new(&entry.file, &uploader)
    }
}

/// Execute file commands
pub async fn execute(
    args: &FileArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.acting_as(user).await?;
    let files = &app.services.files;

    match &args.command {
        FileCommand::List {
            view,
            folder,
            search,
            kind,
            sort,
        } => {
            let query = FileQuery {
                view: *view,
                folder_id: super::parse_optional_id(folder.as_deref(), "folder")?,
                search: search.clone(),
                kind: *kind,
                sort: *sort,
            };
            let entries = app.services.query.list_files(&ctx, &query).await?;
            let rows: Vec<FileRow> = entries.iter().map(FileRow::from).collect();
            output::print_list(&rows, format);
        }
        FileCommand::Upload {
            paths,
            folder,
            mime,
        } => {
            let folder_id = super::parse_optional_id(folder.as_deref(), "folder")?;
            let mut candidates = Vec::with_capacity(paths.len());
            for path in paths {
                candidates.push(read_candidate(path, mime.as_deref()).await?);
            }
            upload(app, &ctx, candidates, folder_id, format).await?;
        }
        FileCommand::Get { id } => {
            let file = files.get_file(&ctx, super::parse_id(id, "file")?).await?;
            match format {
                OutputFormat::Json => output::print_item(&file, format),
                OutputFormat::Table => print_file(&file),
            }
        }
        FileCommand::Rename { id, name } => {
            let file = files.rename(&ctx, super::parse_id(id, "file")?, name).await?;
            output::print_success(&format!("File renamed to '{}'", file.filename));
        }
        FileCommand::Move { id, folder } => {
            let id = super::parse_id(id, "file")?;
            let folder_id = super::parse_optional_id(Some(folder), "folder")?;
            let file = files.move_to_folder(&ctx, id, folder_id).await?;
            output::print_success(&format!("File '{}' moved", file.filename));
        }
        FileCommand::Download { id, output: path } => {
            let download = files.download(&ctx, super::parse_id(id, "file")?).await?;
            let path = path
                .clone()
                .unwrap_or_else(|| PathBuf::from(&download.filename));
            tokio::fs::write(&path, &download.data).await?;
            output::print_success(&format!(
                "Saved {} to {}",
                output::human_bytes(download.data.len() as i64),
                path.display()
            ));
        }
        FileCommand::Url { id } => {
            let signed = files.signed_url(&ctx, super::parse_id(id, "file")?).await?;
            match format {
                OutputFormat::Json => output::print_item(&signed, format),
                OutputFormat::Table => {
                    println!("{}", signed.url);
                    output::print_kv("expires", &signed.expires_at.to_rfc3339());
                }
            }
        }
        FileCommand::Favorite { id, off } => {
            let id = super::parse_id(id, "file")?;
            let file = app.services.favorites.set_favorite(&ctx, id, !off).await?;
            let state = if file.is_favorite { "added to" } else { "removed from" };
            output::print_success(&format!("'{}' {state} favorites", file.filename));
        }
    }

    Ok(())
}

/// Run a batch, printing per-file outcomes as they arrive. Ctrl-C stops
/// files that have not started yet.
async fn upload(
    app: &App,
    ctx: &RequestContext,
    candidates: Vec<UploadCandidate>,
    folder_id: Option<uuid::Uuid>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let options = UploadOptions {
        folder_id,
        events: Some(tx),
        cancel: Some(cancel),
    };
    let printer = async {
        while let Some(event) = rx.recv().await {
            if format == OutputFormat::Table {
                print_event(&event);
            }
        }
    };
    let (report, ()) = tokio::join!(
        app.services.upload.upload_batch(ctx, candidates, options),
        printer
    );
    interrupt.abort();
    let report = report?;

    if format == OutputFormat::Json {
        let rows: Vec<FileRow> = report
            .uploaded
            .iter()
            .map(|f| FileRow::new(f, &ctx.username))
            .collect();
        output::print_list(&rows, format);
    }
    if report.uploaded.is_empty() && !report.failed.is_empty() {
        return Err(AppError::validation("No files were uploaded"));
    }
    Ok(())
}

fn print_event(event: &UploadEvent) {
    match event {
        UploadEvent::Progress {
            filename, percent, ..
        } => {
            tracing::debug!(filename = %filename, percent, "Upload progress");
        }
        UploadEvent::Uploaded { file, .. } => {
            output::print_success(&format!("{} ({})", file.filename, file.id));
        }
        UploadEvent::Failed {
            filename, reason, ..
        } => {
            output::print_warning(&format!("{filename}: {reason}"));
        }
        UploadEvent::BatchComplete { uploaded, failed } => {
            println!("{uploaded} uploaded, {failed} failed");
        }
    }
}

async fn read_candidate(path: &Path, mime: Option<&str>) -> Result<UploadCandidate, AppError> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::validation(format!("'{}' is not a file path", path.display())))?
        .to_string();
    let mime_type = mime_for(&filename)
        .or(mime)
        .ok_or_else(|| {
            AppError::validation(format!("Cannot tell the type of '{filename}', pass --mime"))
        })?
        .to_string();
    let data = tokio::fs::read(path).await?;
    Ok(UploadCandidate::new(filename, mime_type, Bytes::from(data)))
}

/// MIME type of the accepted document formats, by extension.
fn mime_for(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(mime)
}

fn print_file(file: &File) {
    output::print_kv("id", &file.id.to_string());
    output::print_kv("name", &file.filename);
    output::print_kv("type", &file.file_type);
    output::print_kv("kind", file.kind().as_str());
    output::print_kv("size", &output::human_bytes(file.file_size));
    output::print_kv(
        "folder",
        &file
            .folder_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "root".to_string()),
    );
    output::print_kv("favorite", &file.is_favorite.to_string());
    output::print_kv("uploaded", &output::short_time(&file.upload_date));
    if let Some(at) = &file.last_accessed {
        output::print_kv("last accessed", &output::short_time(at));
    }
    if let Some(at) = &file.deleted_at {
        output::print_kv("trashed", &output::short_time(at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_extensions() {
        assert_eq!(mime_for("notes.PDF"), Some("application/pdf"));
        assert_eq!(
            mime_for("week1.pptx").map(FileKind::from_mime),
            Some(FileKind::Powerpoint)
        );
        assert_eq!(mime_for("photo.png"), None);
        assert_eq!(mime_for("README"), None);
    }
}
