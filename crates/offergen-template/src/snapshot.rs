//! Read-only view of a whole template for the UI layer.

use offergen_core::{Error, Node, Result};
use serde::Serialize;

use crate::template::{OfferTemplate, Pools};

/// `offer`, then every pool as `id -> {uiClass, fields, data}`.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub offer: &'a Node,
    #[serde(flatten)]
    pub pools: &'a Pools,
}

impl OfferTemplate {
    pub fn snapshot(&self) -> Result<Snapshot<'_>> {
        Ok(Snapshot {
            offer: self.offer().ok_or(Error::NotLoaded)?,
            pools: self.pools(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offergen_core::vocab::ODRL_TARGET_KEY;
    use offergen_core::{EntityKind, EntityRef};

    #[test]
    fn snapshot_lists_offer_then_pools() {
        let mut template = OfferTemplate::new();
        let id = template
            .add_entity(&EntityRef::offer(), EntityKind::Target, ODRL_TARGET_KEY, None)
            .unwrap();

        let value = serde_json::to_value(template.snapshot().unwrap()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["offer", "permission", "prohibition", "constraint", "duty", "target"]
        );
        assert_eq!(value["offer"]["uiClass"], "offer");
        assert_eq!(value["target"][&id]["uiClass"], "target");
        assert_eq!(value["target"][&id]["data"]["@id"], id.as_str());
    }
}
