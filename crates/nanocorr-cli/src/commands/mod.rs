pub mod align;
pub mod config;
pub mod correlate;
pub mod locate;
pub mod zoom;
