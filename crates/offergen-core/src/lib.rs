//! Offergen Core - vocabulary, node types, entity factory and error handling

pub mod config;
pub mod entity;
pub mod error;
pub mod types;
pub mod vocab;

pub use config::TemplateConfig;
pub use entity::{fields_for, EntityFactory, Field, Node, UiClass};
pub use error::{Error, Result};
pub use types::*;
