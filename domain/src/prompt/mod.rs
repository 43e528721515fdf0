//! Prompt construction for every inference call the system makes.

pub mod template;

pub use template::PromptTemplate;
