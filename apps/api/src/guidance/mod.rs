pub mod aq;
pub mod engine;
pub mod prompts;
pub mod records;
pub mod skills;
pub mod traits;

pub use engine::GuidanceEngine;
