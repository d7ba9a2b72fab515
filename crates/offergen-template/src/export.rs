//! Export: the offer plus every pooled node reachable from it.

use offergen_core::{EntityKind, Error, Node, Result};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::template::OfferTemplate;

type Key<'a> = (EntityKind, &'a str);

impl OfferTemplate {
    /// The pruned graph: the offer's data first, then reachable nodes in pool
    /// order and insertion order within each pool.
    pub fn export_graph(&self) -> Result<Vec<Value>> {
        let offer = self.offer.as_ref().ok_or(Error::NotLoaded)?;

        let mut in_use: HashSet<Key<'_>> = HashSet::new();
        let mut queue: VecDeque<Key<'_>> = VecDeque::new();
        mark_references(offer, &mut in_use, &mut queue);

        while let Some((kind, id)) = queue.pop_front() {
            match self.get(kind, id) {
                Some(node) => mark_references(node, &mut in_use, &mut queue),
                None => debug!(kind = %kind, id, "skipping dangling reference"),
            }
        }

        let mut graph = vec![Value::Object(offer.data().clone())];
        for (kind, pool) in self.pools.iter() {
            graph.extend(
                pool.iter()
                    .filter(|(id, _)| in_use.contains(&(kind, id.as_str())))
                    .map(|(_, node)| Value::Object(node.data().clone())),
            );
        }

        debug!(
            nodes = graph.len(),
            pruned = self.pools.len() + 1 - graph.len(),
            "offer exported"
        );
        Ok(graph)
    }

    /// The pruned graph as a JSON string.
    pub fn construct(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export_graph()?)?)
    }
}

fn mark_references<'a>(
    node: &'a Node,
    in_use: &mut HashSet<Key<'a>>,
    queue: &mut VecDeque<Key<'a>>,
) {
    for kind in EntityKind::CHILDREN {
        let Some(key) = kind.relation_key() else {
            continue;
        };
        for id in node.references(key) {
            if in_use.insert((kind, id)) {
                queue.push_back((kind, id));
            }
        }
    }
}
