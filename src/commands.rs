//! Command implementations for the offergen CLI.
//!
//! Each command returns the JSON it would print, so the binary only handles
//! argument parsing and output.

use offergen_core::vocab::CONSTRAINT_OPERANDS;
use offergen_core::TemplateConfig;
use offergen_template::{Action, OfferTemplate};
use serde_json::Value;
use std::path::Path;

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))
}

/// Read a JSON array of actions.
pub fn read_actions(path: &Path) -> anyhow::Result<Vec<Action>> {
    let value = read_json(path)?;
    serde_json::from_value(value)
        .map_err(|e| anyhow::anyhow!("Invalid actions in {}: {}", path.display(), e))
}

async fn load(document: &Value, config: TemplateConfig) -> anyhow::Result<OfferTemplate> {
    let mut template = OfferTemplate::with_config(config);
    template
        .load(document)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load offer: {}", e))?;
    Ok(template)
}

/// Export of a fresh template.
pub fn new_offer(config: TemplateConfig) -> anyhow::Result<Value> {
    let template = OfferTemplate::with_config(config);
    Ok(Value::Array(template.export_graph()?))
}

/// Load a document and export it again, pruned and under temporary ids.
pub async fn normalize(document: &Value, config: TemplateConfig) -> anyhow::Result<Value> {
    let template = load(document, config).await?;
    Ok(Value::Array(template.export_graph()?))
}

/// Load a document, apply `actions` in order and export the result.
pub async fn edit(
    document: &Value,
    actions: &[Action],
    config: TemplateConfig,
) -> anyhow::Result<Value> {
    let mut template = load(document, config).await?;
    for (i, action) in actions.iter().enumerate() {
        template
            .apply(action)
            .map_err(|e| anyhow::anyhow!("Action {} failed: {}", i, e))?;
    }
    tracing::info!(actions = actions.len(), "edits applied");
    Ok(Value::Array(template.export_graph()?))
}

/// Load a document and return the full template view, orphans included.
pub async fn inspect(document: &Value, config: TemplateConfig) -> anyhow::Result<Value> {
    let template = load(document, config).await?;
    Ok(serde_json::to_value(template.snapshot()?)?)
}

/// The recognised constraint operands.
pub fn operands() -> anyhow::Result<Value> {
    Ok(serde_json::to_value(CONSTRAINT_OPERANDS)?)
}

pub fn render(value: &Value, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}
