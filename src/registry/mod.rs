pub mod engine;
pub mod error;
pub mod topic;

pub use engine::Registry;
pub use error::RegistryError;
pub use topic::{Identity, Topic, TopicState};
