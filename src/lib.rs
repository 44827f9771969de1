pub mod analytics;
pub mod app;
pub mod body;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod events;
pub mod feed;
pub mod interaction;
pub mod mailbox;
pub mod particles;
pub mod physics;
pub mod registry;
pub mod scene;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod time;
pub mod transport;
pub mod voice;

pub use app::{run, run_with_config, run_with_overrides};
pub use registry::ObjectRegistry;
pub use session::{Session, SessionSettings};
pub use snapshot::FrameSnapshot;
