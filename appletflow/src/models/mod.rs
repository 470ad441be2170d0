pub mod diff;
pub mod edge;
pub mod export;
pub mod history;
pub mod node;
pub mod project;
pub mod snapshot;
pub mod workflow;
