//! Offergen Template - the offer template engine
//!
//! Loads an ODRL offer graph, edits it in place and exports the part of
//! the graph still reachable from the offer.

pub mod action;
pub mod expand;
pub mod export;
pub mod snapshot;
pub mod template;

pub use action::{Action, AttributeTarget, ParentRef};
pub use expand::{expand_document, ContextExpander, DocumentExpander};
pub use snapshot::Snapshot;
pub use template::{classify, OfferTemplate, Pools};
