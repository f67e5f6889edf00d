//! External language-model analysis

pub mod analyst;
pub mod prompts;
