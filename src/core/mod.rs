pub mod alerts;
pub mod audio;
pub mod config;
pub mod model;
