pub mod accuracy;
pub mod analysis;
pub mod config;
pub mod dimension;
pub mod error;
pub mod generator;
pub mod history;
pub mod scoring;
pub mod store;
pub mod weights;
