//! App - application layer
//!
//! Puts the store, service, queues, worker pool and retry scheduler together.
//!
//! # Components
//! - **AppBuilder**: configuration and startup
//! - **App**: submit / get / list / healthcheck, and ordered shutdown
//! - **Health**: healthcheck answer

pub mod builder;
pub mod runtime;
pub mod status;

pub use self::builder::{AppBuilder, BuildError};
pub use self::runtime::App;
pub use self::status::Health;
