#[derive(thiserror::Error, Debug)]
pub enum DumpError {
    #[error(transparent)]
    Bulk(#[from] shopsync_bulk::BulkError),
    #[error(transparent)]
    Client(#[from] shopsync_client::ClientError),
    #[error("writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
