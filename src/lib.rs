pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod map_draw;
pub mod naming;
pub mod state;
pub mod ui;
pub mod viewport;
