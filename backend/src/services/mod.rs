pub mod data_sources;
pub mod merge;
pub mod sessions;
pub mod templates;
