//! Edit commands as sent by the UI layer.
//!
//! Kinds arrive as strings and are parsed here, so an unknown kind maps to
//! the same errors as the typed API.

use offergen_core::{EntityKind, EntityRef, Error, FieldPath, InputKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::template::OfferTemplate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    /// Replace the template with a fresh default offer.
    NewOffer,
    UpdateAttribute {
        target: AttributeTarget,
        key: FieldPath,
        value: Value,
    },
    UpdateConstraint {
        id: String,
        key: String,
        /// HTML input type of the widget the value came from.
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        input_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    AddEntity {
        parent: ParentRef,
        #[serde(rename = "type")]
        kind: String,
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    RemoveEntity {
        parent: ParentRef,
        key: String,
        id: String,
    },
}

/// `"offer"` or `[kind, id]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeTarget {
    Named(String),
    Pooled(String, String),
}

impl AttributeTarget {
    fn resolve(&self) -> Result<EntityRef> {
        match self {
            Self::Named(name) if name == EntityKind::Offer.as_str() => Ok(EntityRef::offer()),
            Self::Named(name) => Err(Error::InvalidType(name.clone())),
            Self::Pooled(kind, id) => match kind.parse::<EntityKind>() {
                Ok(kind) if kind != EntityKind::Offer => Ok(EntityRef::new(kind, id.as_str())),
                _ => Err(Error::InvalidType(format!("{},{}", kind, id))),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ParentRef {
    fn resolve(&self) -> Result<EntityRef> {
        EntityRef::parse_parent(&self.kind, &self.id)
    }
}

impl OfferTemplate {
    pub fn apply(&mut self, action: &Action) -> Result<()> {
        debug!(?action, "applying action");
        match action {
            Action::NewOffer => {
                self.reset();
                Ok(())
            }
            Action::UpdateAttribute { target, key, value } => {
                self.update_attribute(&target.resolve()?, key, value.clone())
            }
            Action::UpdateConstraint {
                id,
                key,
                input_type,
                value,
            } => self.update_constraint(
                id,
                key,
                InputKind::from_input_type(input_type.as_deref()),
                value.as_deref(),
            ),
            Action::AddEntity {
                parent,
                kind,
                key,
                id,
            } => {
                let child = kind.parse::<EntityKind>()?;
                let parent = parent.resolve()?;
                self.add_entity(&parent, child, key, id.as_deref()).map(|_| ())
            }
            Action::RemoveEntity { parent, key, id } => {
                self.remove_entity(&parent.resolve()?, key, id)
            }
        }
    }

    /// Apply actions in order, stopping at the first failure.
    pub fn apply_all<'a>(&mut self, actions: impl IntoIterator<Item = &'a Action>) -> Result<()> {
        actions.into_iter().try_for_each(|action| self.apply(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_deserialize_from_ui_shape() {
        let actions: Vec<Action> = serde_json::from_value(json!([
            {"action": "newOffer"},
            {"action": "updateAttribute", "target": "offer", "key": "foo", "value": "bar"},
            {"action": "updateAttribute", "target": ["duty", "d1"], "key": ["a", "0"], "value": 1},
            {"action": "updateConstraint", "id": "c1", "key": "k", "type": "select-one", "value": "v"},
            {"action": "addEntity", "parent": {"id": "1", "type": "offer"}, "type": "duty", "key": "k"},
            {"action": "removeEntity", "parent": {"id": "1", "type": "offer"}, "key": "k", "id": "d1"}
        ]))
        .unwrap();

        assert_eq!(actions[0], Action::NewOffer);
        assert!(matches!(
            &actions[2],
            Action::UpdateAttribute { target: AttributeTarget::Pooled(kind, _), .. } if kind == "duty"
        ));
        assert!(matches!(&actions[4], Action::AddEntity { id: None, .. }));
    }

    #[test]
    fn unknown_attribute_target_is_invalid_type() {
        let err = AttributeTarget::Named("foo".into()).resolve().unwrap_err();
        assert_eq!(err.to_string(), "Invalid type foo");
        let err = AttributeTarget::Pooled("offer".into(), "x".into())
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidType(_)));
    }

    #[test]
    fn add_entity_checks_child_kind_before_parent() {
        let mut template = OfferTemplate::new();
        let action = Action::AddEntity {
            parent: ParentRef {
                id: "foo".into(),
                kind: "bar".into(),
            },
            kind: "foo".into(),
            key: "k".into(),
            id: None,
        };
        let err = template.apply(&action).unwrap_err();
        assert_eq!(err.to_string(), "Invalid type foo");
    }
}
