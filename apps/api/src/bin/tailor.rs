//! `tailor`: command-line client for the tailoring API.
//!
//! Uploads a résumé PDF, tailors it to a job description, streams a cover letter
//! alongside, and writes the rendered documents to disk.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use bytes::Bytes;
use clap::{Parser, ValueEnum};
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use tailor_api::client::{reduce, Action, ApiClient, SessionState, UploadedDocument};
use tailor_api::cover_letter::handlers::CoverLetterRequest;
use tailor_api::models::resume::ResumeDraft;
use tailor_api::render::filename::{cover_letter_filename, resume_filename};
use tailor_api::render::{docx, pdf, Format};

#[derive(Debug, Parser)]
#[command(author, version, about = "Tailor a résumé PDF to a job description")]
struct Args {
    /// Base URL of the tailoring API.
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Résumé to tailor (PDF).
    #[arg(long)]
    resume: PathBuf,

    /// Plain-text file holding the job description.
    #[arg(long)]
    job: PathBuf,

    /// LinkedIn URL to use instead of whatever the résumé lists.
    #[arg(long)]
    linkedin: Option<String>,

    /// Extra instructions the rewrite must follow.
    #[arg(long)]
    instructions: Option<String>,

    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Pdf)]
    format: OutputFormat,

    #[arg(long)]
    skip_cover_letter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Pdf,
    Docx,
    Both,
}

impl OutputFormat {
    fn formats(self) -> &'static [Format] {
        match self {
            OutputFormat::Pdf => &[Format::Pdf],
            OutputFormat::Docx => &[Format::Docx],
            OutputFormat::Both => &[Format::Pdf, Format::Docx],
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging()?;

    let client = ApiClient::new(&args.server).context("build HTTP client")?;
    let mut state = initial_state(&args).await?;

    anyhow::ensure!(state.can_parse(), "no résumé selected");
    state = reduce(state, Action::ParseStarted);
    let upload = state.upload.clone().context("no résumé selected")?;
    state = match client.parse(&upload).await {
        Ok(text) => reduce(state, Action::ParseSucceeded(text)),
        Err(err) => anyhow::bail!("parse {}: {err}", upload.file_name),
    };
    info!(
        chars = state.extracted_text.chars().count(),
        "extracted résumé text"
    );

    anyhow::ensure!(
        state.can_generate(),
        "nothing to tailor: résumé text or job description is empty"
    );
    state = generate(&client, state, !args.skip_cover_letter).await;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir: {}", args.out_dir.display()))?;

    if let Some(draft) = &state.resume {
        for &format in args.format.formats() {
            let bytes = match format {
                Format::Pdf => pdf::render_resume(draft),
                Format::Docx => docx::render_resume_docx(draft),
            }
            .context("Failed to render document")?;
            let path = args.out_dir.join(resume_filename(Some(draft), format));
            write_atomically(&path, &bytes)?;
            println!("{}", path.display());
        }
    }

    if !args.skip_cover_letter && !state.cover_letter.trim().is_empty() {
        let draft = state.resume.as_ref();
        for &format in args.format.formats() {
            let bytes = render_cover_letter(&state.cover_letter, draft, format)
                .context("Failed to render document")?;
            let path = args.out_dir.join(cover_letter_filename(draft, format));
            write_atomically(&path, &bytes)?;
            println!("{}", path.display());
        }
    }

    match (&state.resume, &state.last_error) {
        (None, Some(err)) => anyhow::bail!("{err}"),
        (None, None) => anyhow::bail!("no résumé was generated"),
        (Some(_), Some(err)) => {
            warn!("finished with errors: {err}");
            Ok(())
        }
        (Some(_), None) => Ok(()),
    }
}

async fn initial_state(args: &Args) -> anyhow::Result<SessionState> {
    let bytes = tokio::fs::read(&args.resume)
        .await
        .with_context(|| format!("read résumé: {}", args.resume.display()))?;
    let job_description = tokio::fs::read_to_string(&args.job)
        .await
        .with_context(|| format!("read job description: {}", args.job.display()))?;
    let file_name = args
        .resume
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume.pdf".to_string());

    let mut actions = vec![
        Action::FileSelected(UploadedDocument {
            file_name,
            bytes: Bytes::from(bytes),
        }),
        Action::JobDescriptionChanged(job_description),
    ];
    if let Some(url) = &args.linkedin {
        actions.push(Action::LinkedinUrlChanged(url.clone()));
    }
    if let Some(text) = &args.instructions {
        actions.push(Action::CustomInstructionsChanged(text.clone()));
    }
    Ok(actions.into_iter().fold(SessionState::default(), reduce))
}

/// Runs the rewrite and (optionally) the cover letter concurrently, folding their
/// results into the session as they arrive.
async fn generate(client: &ApiClient, mut state: SessionState, with_letter: bool) -> SessionState {
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    state = reduce(state, Action::RewriteStarted);
    {
        let client = client.clone();
        let request = state.rewrite_request();
        let tx = tx.clone();
        tokio::spawn(async move {
            let action = match client.rewrite(&request).await {
                Ok(draft) => Action::RewriteSucceeded(draft),
                Err(err) => Action::RewriteFailed(format!("Failed to generate resume: {err}")),
            };
            let _ = tx.send(action);
        });
    }

    if with_letter && state.can_write_cover_letter() {
        state = reduce(state, Action::CoverLetterStarted);
        tokio::spawn(stream_cover_letter(
            client.clone(),
            state.cover_letter_request(),
            tx.clone(),
        ));
    }
    drop(tx);

    while let Some(action) = rx.recv().await {
        match &action {
            Action::RewriteSucceeded(draft) => info!(
                experience = draft.experience.len(),
                projects = draft.projects.len(),
                "résumé generated"
            ),
            Action::CoverLetterChunk(chunk) => debug!(bytes = chunk.len(), "cover letter chunk"),
            Action::CoverLetterFinished => info!("cover letter complete"),
            Action::RewriteFailed(err) | Action::CoverLetterFailed(err) => warn!("{err}"),
            _ => {}
        }
        state = reduce(state, action);
    }
    state
}

async fn stream_cover_letter(
    client: ApiClient,
    request: CoverLetterRequest,
    tx: mpsc::UnboundedSender<Action>,
) {
    let mut chunks = match client.cover_letter(&request).await {
        Ok(chunks) => chunks,
        Err(err) => {
            let _ = tx.send(Action::CoverLetterFailed(format!(
                "Error generating cover letter: {err}"
            )));
            return;
        }
    };

    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(text) => {
                let _ = tx.send(Action::CoverLetterChunk(text));
            }
            Err(err) => {
                let _ = tx.send(Action::CoverLetterFailed(format!(
                    "Cover letter stream interrupted: {err}"
                )));
                return;
            }
        }
    }
    let _ = tx.send(Action::CoverLetterFinished);
}

fn render_cover_letter(
    text: &str,
    draft: Option<&ResumeDraft>,
    format: Format,
) -> Result<Vec<u8>, tailor_api::render::RenderError> {
    match format {
        Format::Pdf => pdf::render_cover_letter(text, draft),
        Format::Docx => docx::render_cover_letter_docx(text, draft),
    }
}

/// Writes through a temp file in the target directory so a failed write never
/// leaves a truncated document behind.
fn write_atomically(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("persist {}", path.display()))?;
    Ok(())
}

fn init_logging() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
