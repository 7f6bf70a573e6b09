//! Body scaling jobs run out of process.
//!
//! Each job is one engine process: the engine receives
//! `base output height weight [texture]` as positional arguments and either
//! writes a GLB at `output` and exits 0, or exits with one of the codes in
//! [`status`]. This crate builds those invocations from generation requests,
//! lays out output files per owner, enforces deadlines, and cleans up.
//!
//! # Example
//!
//! ```no_run
//! use body_jobs::{GenerateRequest, ServerConfig, generate};
//!
//! let config = ServerConfig::default().with_public_url("https://example.com/models");
//! let response = generate(&config, &GenerateRequest {
//!     gender: "male".into(),
//!     height: 180.0,
//!     weight: 80.0,
//!     age: 30,
//!     texture: Some("denim.png".into()),
//!     nickname: "bob".into(),
//! }).unwrap();
//! println!("{}", response.glb_url);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod cleanup;
mod config;
mod error;
mod generate;
mod request;
mod runner;
pub mod status;

pub use cleanup::{CleanupReport, clean_generated};
pub use config::{EngineConfig, ServerConfig};
pub use error::{JobError, JobResult};
pub use generate::{GenerateRequest, GenerateResponse, generate, generate_at};
pub use request::{
    JobRequest, ScalingRequest, TIMESTAMP_FORMAT, output_file_name, owner_dir, reserve_output,
    resolve_texture,
};
pub use runner::{JobOutcome, JobRunner, POLL_INTERVAL};
