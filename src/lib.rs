pub mod analysis;
pub mod annotate;
pub mod config;
pub mod consensus;
pub mod error;
pub mod evaluate;
pub mod feedback;
pub mod landmark;
pub mod library;
pub mod normalize;
pub mod provider;
pub mod report;
pub mod sidecar;
pub mod similarity;
pub mod video;
