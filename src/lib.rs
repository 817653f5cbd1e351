//! paperbanana - Generate academic illustrations from methodology text
//!
//! A five-agent pipeline (retriever, planner, stylist, visualizer, critic)
//! that turns a paper's methodology section into a publication-style diagram
//! through Gemini, or into matplotlib code for statistical plots.

pub mod agents;
pub mod cli;
pub mod config;
pub mod error;
pub mod guidelines;
pub mod llm;
pub mod pipeline;
pub mod presets;
pub mod reference;
pub mod util;
