pub mod core;
pub mod ingest;
pub mod lookup;
pub mod session;
pub mod setup;
