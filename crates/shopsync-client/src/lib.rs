pub mod client;
pub mod cost;
pub mod pagination;
pub mod retry;

pub use client::{ClientError, GraphQlClient};
pub use pagination::{collect_all, ConnectionPath};
pub use retry::RetryPolicy;
