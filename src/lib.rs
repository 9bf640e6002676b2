//! Text2Quiz backend library: document ingestion, question generation, the
//! quiz session state machine, and the HTTP surface that ties them together.

pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod generate;
pub mod ingest;
pub mod protocol;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod util;
