//! Agent Host - the conversational side of Data Helper
//!
//! This crate provides:
//! - The boundary to the external natural-language data agent
//! - Classification of agent replies into renderable responses
//! - Query sessions that fall back to automatic insights when the agent fails

pub mod classifier;
pub mod session;

pub use classifier::{classify, classify_output};
pub use session::{is_agent_failure, is_insight_question, DataAgent, QuerySession};
