//! Integration tests against mock HTTP servers

mod mock_server;

mod cancellation;
mod generate;
mod models;
mod retry;
mod streaming;
