//! Error types for the offer template engine

use thiserror::Error;

use crate::types::EntityKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("expansion error: {0}")]
    Expansion(String),

    #[error("Cannot load data")]
    CannotLoad,

    #[error("Invalid type {0}")]
    InvalidType(String),

    #[error("Invalid parent with type {kind} and id {id}")]
    InvalidParent { kind: String, id: String },

    #[error("Cannot add a {child} to a {parent}")]
    CannotAdd { child: EntityKind, parent: EntityKind },

    #[error("{kind} {id} does not exist")]
    MissingEntity { kind: EntityKind, id: String },

    #[error("{kind} {id} has already been added to {parent} {parent_id}")]
    AlreadyAdded {
        kind: EntityKind,
        id: String,
        parent: EntityKind,
        parent_id: String,
    },

    #[error("Entity {0} does not belong to parent")]
    NotLinked(String),

    #[error("value under {0} is not a list")]
    NotAList(String),

    #[error("attribute path is empty")]
    EmptyPath,

    #[error("attribute path {0} indexes past the end of a list")]
    InvalidPath(String),

    #[error("no offer loaded")]
    NotLoaded,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn expansion(message: impl Into<String>) -> Self {
        Self::Expansion(message.into())
    }

    pub fn invalid_parent(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::InvalidParent {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn missing(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::MissingEntity {
            kind,
            id: id.into(),
        }
    }
}
