//! Agent loop - drives the model/tool conversation for a single turn

mod engine;

pub use engine::{AgentConfig, AgentEngine};
