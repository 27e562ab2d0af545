//! client-side _(local)_ entrypoint and supporting routines
// (c) 2026 Ferry contributors

mod driver;
pub use driver::Downloader;

mod job;
pub use job::{CollisionPolicy, TransferRequest};

mod main_loop;
pub use main_loop::client_main;

mod manifest;
pub use manifest::{parse_manifest, read_manifest};

mod options;
pub use options::Parameters;

pub(crate) mod progress;

mod scheduler;
pub use scheduler::{schedule, Priority, Rejection, Schedule, ScheduledJob};
