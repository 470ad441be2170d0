pub mod ai;
pub mod autosave;
pub mod aws;
pub mod generator;
pub mod local_store;
pub mod preview;
pub mod prompt;
