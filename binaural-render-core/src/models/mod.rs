pub mod config;
pub mod error;
pub mod render_pass;
pub mod scene;
pub mod state;
