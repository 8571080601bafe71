mod builder;
mod collapse;
mod component;
mod config;
mod controller;
mod export;
mod render;
mod session;
mod simulation;
mod spiral;
mod state;
mod style;
mod types;
mod viewer;

pub use builder::parse_records;
pub use viewer::NetworkViewer;
