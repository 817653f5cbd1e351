// The five pipeline agents. Each borrows its LLM client from the pipeline and
// owns only its prompt customisation.

pub mod critic;
pub mod planner;
pub mod retriever;
pub mod stylist;
pub mod visualizer;

pub use critic::{CriticAgent, Critique, Severity};
pub use planner::PlannerAgent;
pub use retriever::RetrieverAgent;
pub use stylist::StylistAgent;
pub use visualizer::{Mode, VisualizerAgent};
