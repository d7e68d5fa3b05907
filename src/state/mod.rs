//! State module for tracking crawl progress
//!
//! This module provides the state types shared by the crawler components.
//!
//! # Components
//!
//! - `CrawlTarget`: A URL to visit, tagged with the kind of page it is
//! - `RunState`: The lifecycle of one crawl run (idle, running, draining, done)
//! - `HostState`: Per-host request spacing used for politeness

mod host_state;
mod run_state;
mod target;

// Re-export main types
pub use host_state::HostState;
pub use run_state::RunState;
pub use target::{CrawlTarget, TargetKind};
