pub mod backfill;
pub mod handlers;
pub mod service;
