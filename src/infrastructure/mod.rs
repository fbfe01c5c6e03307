//! Infrastructure layer - Store implementations, auth and admission control

pub mod auth;
pub mod logging;
pub mod rate_limit;
pub mod revocation;
pub mod storage;
pub mod tasks;
pub mod user;
