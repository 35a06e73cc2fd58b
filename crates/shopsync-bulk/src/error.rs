#[derive(thiserror::Error, Debug)]
pub enum BulkError {
    #[error("bulk operation submission failed: {0}")]
    SubmissionFailed(String),

    #[error("bulk operation ended in {status}: {detail}")]
    TerminalFailure { status: String, detail: String },

    #[error("failed to download bulk result: {0}")]
    DownloadFailed(String),

    #[error(transparent)]
    Request(#[from] shopsync_client::ClientError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
