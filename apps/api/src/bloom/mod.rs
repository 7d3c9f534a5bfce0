//! Bloom's taxonomy question classification.

pub mod classifier;
pub mod evaluation;
pub mod handlers;
pub mod labels;
pub mod levels;
pub mod sheet;

pub use classifier::{BloomClassifier, ClassifierError, HostedBloomClassifier, LabelScore};
pub use labels::LabelMap;
