pub mod generator;
pub mod history;

pub use generator::{GenerateOptions, GenerationResult, Pipeline};
pub use history::{DescriptionKind, DescriptionRecord, History, ImageRecord};
