//! The offer template: one offer node plus a pool per child kind.
//!
//! Nodes are addressed by `(kind, id)`. Unlinking a node never removes it
//! from its pool; unreachable nodes are pruned on export.

use indexmap::IndexMap;
use offergen_core::vocab::*;
use offergen_core::{
    id_ref, ref_id, set_path, types_of, EntityFactory, EntityKind, EntityRef, Error, FieldPath,
    InputKind, JsonMap, Node, Result, TemplateConfig,
};
use regex::{NoExpand, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::expand::{ContextExpander, DocumentExpander};

/// Nodes known to a template, one insertion-ordered map per child kind.
/// Serializes in pool order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Pools {
    pub permission: IndexMap<String, Node>,
    pub prohibition: IndexMap<String, Node>,
    pub constraint: IndexMap<String, Node>,
    pub duty: IndexMap<String, Node>,
    pub target: IndexMap<String, Node>,
}

impl Pools {
    pub fn get(&self, kind: EntityKind) -> Option<&IndexMap<String, Node>> {
        match kind {
            EntityKind::Offer => None,
            EntityKind::Permission => Some(&self.permission),
            EntityKind::Prohibition => Some(&self.prohibition),
            EntityKind::Constraint => Some(&self.constraint),
            EntityKind::Duty => Some(&self.duty),
            EntityKind::Target => Some(&self.target),
        }
    }

    fn get_mut(&mut self, kind: EntityKind) -> Option<&mut IndexMap<String, Node>> {
        match kind {
            EntityKind::Offer => None,
            EntityKind::Permission => Some(&mut self.permission),
            EntityKind::Prohibition => Some(&mut self.prohibition),
            EntityKind::Constraint => Some(&mut self.constraint),
            EntityKind::Duty => Some(&mut self.duty),
            EntityKind::Target => Some(&mut self.target),
        }
    }

    /// Pools paired with their kind, in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &IndexMap<String, Node>)> {
        EntityKind::CHILDREN
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|pool| (kind, pool)))
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, pool)| pool.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

enum Match {
    Type(&'static str),
    Key(&'static str),
}

impl Match {
    fn matches(&self, data: &JsonMap) -> bool {
        match self {
            Match::Type(class) => types_of(data).contains(class),
            Match::Key(key) => data.contains_key(*key),
        }
    }
}

// First match wins: a duty typed as both Duty and Rule is a duty, a
// constraint also typed as Rule is a constraint.
const CLASSIFIERS: [(Match, EntityKind); 6] = [
    (Match::Type(ODRL_OFFER), EntityKind::Offer),
    (Match::Type(ODRL_PERMISSION), EntityKind::Permission),
    (Match::Type(ODRL_PROHIBITION), EntityKind::Prohibition),
    (Match::Type(ODRL_CONSTRAINT), EntityKind::Constraint),
    (Match::Type(ODRL_DUTY), EntityKind::Duty),
    (Match::Key(OP_FROM_SET), EntityKind::Target),
];

/// Kind of an expanded node, if it is one the template tracks.
pub fn classify(data: &JsonMap) -> Option<EntityKind> {
    CLASSIFIERS
        .iter()
        .find(|(rule, _)| rule.matches(data))
        .map(|(_, kind)| *kind)
}

/// Editable model of one ODRL offer.
pub struct OfferTemplate {
    pub(crate) offer: Option<Node>,
    pub(crate) pools: Pools,
    factory: EntityFactory,
    config: TemplateConfig,
    expander: Arc<dyn DocumentExpander>,
}

impl Default for OfferTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OfferTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfferTemplate")
            .field("offer", &self.offer)
            .field("pools", &self.pools)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OfferTemplate {
    /// A fresh template: a default offer and empty pools.
    pub fn new() -> Self {
        Self::with_config(TemplateConfig::default())
    }

    pub fn with_config(config: TemplateConfig) -> Self {
        Self::with_expander(config, Arc::new(ContextExpander))
    }

    pub fn with_expander(config: TemplateConfig, expander: Arc<dyn DocumentExpander>) -> Self {
        let factory = EntityFactory::new(config.temp_id_prefix.clone());
        let offer = factory.create(EntityKind::Offer, None);
        Self {
            offer: Some(offer),
            pools: Pools::default(),
            factory,
            config,
            expander,
        }
    }

    /// Discard everything and start over from a default offer.
    pub fn reset(&mut self) {
        self.pools.clear();
        self.offer = Some(self.factory.create(EntityKind::Offer, None));
        debug!("template reset");
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// The offer node. `None` after a failed load.
    pub fn offer(&self) -> Option<&Node> {
        self.offer.as_ref()
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    pub fn pool(&self, kind: EntityKind) -> Option<&IndexMap<String, Node>> {
        self.pools.get(kind)
    }

    /// Look up a node. The offer is found by kind alone.
    pub fn get(&self, kind: EntityKind, id: &str) -> Option<&Node> {
        match kind {
            EntityKind::Offer => self.offer.as_ref(),
            _ => self.pools.get(kind)?.get(id),
        }
    }

    fn offer_mut(&mut self) -> Result<&mut Node> {
        self.offer.as_mut().ok_or(Error::NotLoaded)
    }

    /// Import an ODRL document, replacing the current contents.
    ///
    /// The template is cleared before expansion. On failure the offer stays
    /// unset until the next successful load or a reset.
    pub async fn load(&mut self, document: &Value) -> Result<()> {
        self.offer = None;
        self.pools.clear();

        let expanded = self.expander.expand(document).await?;
        let nodes = self.rewrite_ids(&expanded)?;

        let mut dropped = 0usize;
        for node in nodes {
            let Value::Object(data) = node else {
                dropped += 1;
                continue;
            };
            let Some(kind) = classify(&data) else {
                dropped += 1;
                continue;
            };
            if kind == EntityKind::Offer {
                if self.offer.is_some() {
                    warn!("document holds more than one offer, keeping the last");
                }
                self.offer = Some(self.factory.create(kind, Some(data)));
                continue;
            }
            let Some(id) = data.get(KW_ID).and_then(Value::as_str).map(str::to_owned) else {
                warn!(kind = %kind, "dropping node without @id");
                continue;
            };
            if let Some(pool) = self.pools.get_mut(kind) {
                pool.insert(id, self.factory.create(kind, Some(data)));
            }
        }

        if dropped > 0 {
            debug!(dropped, "ignored unclassified nodes");
        }
        if self.offer.is_none() {
            self.pools.clear();
            return Err(Error::CannotLoad);
        }

        info!(
            permissions = self.pools.permission.len(),
            prohibitions = self.pools.prohibition.len(),
            constraints = self.pools.constraint.len(),
            duties = self.pools.duty.len(),
            targets = self.pools.target.len(),
            "offer loaded"
        );
        Ok(())
    }

    // Moves every id under the source prefix into the temporary namespace by
    // substitution over the serialized form, matching case-insensitively.
    fn rewrite_ids(&self, expanded: &[Value]) -> Result<Vec<Value>> {
        if self.config.id_prefix.is_empty() {
            return Err(Error::expansion("empty id prefix"));
        }
        let pattern = RegexBuilder::new(&regex::escape(&self.config.id_prefix))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::expansion(e.to_string()))?;
        let text = serde_json::to_string(expanded)?;
        let text = pattern.replace_all(&text, NoExpand(&self.config.temp_id_prefix));
        Ok(serde_json::from_str(&text)?)
    }

    /// Set the value of a constraint operand.
    ///
    /// Recognised operand keys already on the constraint are removed first,
    /// so a constraint carries one operand at a time.
    pub fn update_constraint(
        &mut self,
        id: &str,
        key: &str,
        input: InputKind,
        value: Option<&str>,
    ) -> Result<()> {
        if self.offer.is_none() {
            return Err(Error::NotLoaded);
        }
        let constraint = self
            .pools
            .constraint
            .get_mut(id)
            .ok_or_else(|| Error::missing(EntityKind::Constraint, id))?;

        let data = constraint.data_mut();
        data.retain(|k, _| !is_constraint_operand(k));
        data.insert(key.to_string(), Value::Array(vec![input.encode(value)]));

        debug!(constraint = id, key, ?input, "constraint updated");
        Ok(())
    }

    /// Deep-set `value` at `path` in the target's data. No schema check.
    pub fn update_attribute(
        &mut self,
        target: &EntityRef,
        path: &FieldPath,
        value: Value,
    ) -> Result<()> {
        let node = match target.kind {
            EntityKind::Offer => self.offer_mut()?,
            kind => self
                .pools
                .get_mut(kind)
                .and_then(|pool| pool.get_mut(&target.id))
                .ok_or_else(|| Error::InvalidType(format!("{},{}", kind, target.id)))?,
        };
        set_path(node.data_mut(), path, value)?;
        debug!(target = %target, path = %path, "attribute updated");
        Ok(())
    }

    fn parent(&self, parent: &EntityRef) -> Result<&Node> {
        match parent.kind {
            EntityKind::Offer => self.offer.as_ref().ok_or(Error::NotLoaded),
            kind => self
                .get(kind, &parent.id)
                .ok_or_else(|| Error::invalid_parent(kind.as_str(), &parent.id)),
        }
    }

    fn parent_mut(&mut self, parent: &EntityRef) -> Result<&mut Node> {
        match parent.kind {
            EntityKind::Offer => self.offer_mut(),
            kind => self
                .pools
                .get_mut(kind)
                .and_then(|pool| pool.get_mut(&parent.id))
                .ok_or_else(|| Error::invalid_parent(kind.as_str(), &parent.id)),
        }
    }

    /// Link a child under `parent.data[key]`, creating it unless `existing`
    /// names a node already in the child's pool. Returns the child id.
    ///
    /// Every check runs before anything is changed.
    pub fn add_entity(
        &mut self,
        parent: &EntityRef,
        child: EntityKind,
        key: &str,
        existing: Option<&str>,
    ) -> Result<String> {
        if child == EntityKind::Offer {
            return Err(Error::InvalidType(child.to_string()));
        }

        let parent_node = self.parent(parent)?;
        if !parent_node.accepts(child) {
            return Err(Error::CannotAdd {
                child,
                parent: parent.kind,
            });
        }

        let (child_id, fresh) = match existing {
            Some(id) => {
                if self.get(child, id).is_none() {
                    return Err(Error::missing(child, id));
                }
                (id.to_string(), None)
            }
            None => {
                let node = self.factory.create(child, None);
                (node.id().unwrap_or_default().to_string(), Some(node))
            }
        };

        match parent_node.data().get(key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                if items.iter().any(|item| ref_id(item) == Some(child_id.as_str())) {
                    return Err(Error::AlreadyAdded {
                        kind: child,
                        id: child_id,
                        parent: parent.kind,
                        parent_id: parent.id.clone(),
                    });
                }
            }
            Some(_) => return Err(Error::NotAList(key.to_string())),
        }

        if let Some(node) = fresh {
            if let Some(pool) = self.pools.get_mut(child) {
                pool.insert(child_id.clone(), node);
            }
        }
        let data = self.parent_mut(parent)?.data_mut();
        match data.get_mut(key) {
            Some(Value::Array(items)) => items.push(id_ref(child_id.as_str())),
            _ => {
                data.insert(
                    key.to_string(),
                    Value::Array(vec![id_ref(child_id.as_str())]),
                );
            }
        }

        debug!(parent = %parent, child = %child, id = %child_id, created = existing.is_none(), "entity linked");
        Ok(child_id)
    }

    /// Unlink `id` from `parent.data[key]`. The child stays in its pool.
    /// A relationship key left empty is removed.
    pub fn remove_entity(&mut self, parent: &EntityRef, key: &str, id: &str) -> Result<()> {
        let data = self.parent_mut(parent)?.data_mut();

        let (removed, now_empty) = match data.get_mut(key) {
            None | Some(Value::Null) => (0, false),
            Some(Value::Array(items)) => {
                let before = items.len();
                items.retain(|item| ref_id(item) != Some(id));
                (before - items.len(), items.is_empty())
            }
            Some(_) => return Err(Error::NotAList(key.to_string())),
        };
        if removed == 0 {
            return Err(Error::NotLinked(id.to_string()));
        }
        if now_empty {
            data.shift_remove(key);
        }

        debug!(parent = %parent, key, id, "entity unlinked");
        Ok(())
    }
}
