pub mod config_check;
pub mod generate;
pub mod presets;
pub mod references;
