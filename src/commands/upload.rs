use crate::api::Mode;
use crate::args::UploadArgs;
use crate::commands::{open_session, Out};
use crate::dashboard::upload::PDF_MIME;
use crate::dashboard::{PdfFile, UploadPhase, UploadQueue};
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Config, Result};
use anyhow::{anyhow, bail};
use std::path::Path;
use tracing::debug;

/// Sends the PDFs among `args.files()` to the backend in a single request.
pub async fn upload(config: Config, mode: Mode, args: UploadArgs) -> Result<Out<UploadQueue>> {
    let mut files = Vec::with_capacity(args.files().len());
    for path in args.files() {
        if !is_pdf(path) {
            debug!("Skipping '{}', it is not a PDF", path.display());
            continue;
        }
        files.push(read_file(path).await.pub_result(ErrorType::Upload)?);
    }

    let queue = UploadQueue::default().add_files(files);
    ensure_files(&queue).pub_result(ErrorType::Upload)?;

    let today = chrono::Local::now().date_naive();
    let mut session = open_session(&config, mode, today).pub_result(ErrorType::Config)?;
    let queue = session.upload(queue).await;
    let outcome: Result<Out<UploadQueue>> = match queue.phase().clone() {
        UploadPhase::Success { .. } => {
            let message = queue.message().unwrap_or_default();
            Ok(Out::new(message, queue))
        }
        UploadPhase::Error { message } => Err(anyhow!(message)),
        other => Err(anyhow!("The upload did not finish, it is {other:?}")),
    };
    outcome.pub_result(ErrorType::Upload)
}

fn ensure_files(queue: &UploadQueue) -> Result<()> {
    if queue.files().is_empty() {
        bail!("No PDF files to upload");
    }
    Ok(())
}

/// The content type is taken from the extension, any case of `.pdf`.
fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

async fn read_file(path: &Path) -> Result<PdfFile> {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
        bail!("'{}' is not a file", path.display());
    };
    let bytes = utils::read_bytes(path).await?;
    Ok(PdfFile::new(name, PDF_MIME, bytes))
}
