#[derive(thiserror::Error, Debug)]
pub enum ApplyError {
    #[error(transparent)]
    Client(#[from] shopsync_client::ClientError),
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("drop operation requires the confirmation string \"delete\"")]
    ConfirmationRequired,
}
