//! JSON-LD expansion
//!
//! `load` consumes documents through the `DocumentExpander` seam. The
//! built-in `ContextExpander` covers the part of JSON-LD 1.0 expansion that
//! offer documents use: inline contexts with prefixes, `@vocab`, default
//! language and typed/containered term definitions. Remote contexts are
//! rejected.

use offergen_core::{Error, JsonMap, Result};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;

/// Turns a raw JSON-LD document into an array of expanded node objects.
#[async_trait::async_trait]
pub trait DocumentExpander: Send + Sync {
    async fn expand(&self, document: &Value) -> Result<Vec<Value>>;
}

/// In-process expander for documents carrying inline contexts.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContextExpander;

#[async_trait::async_trait]
impl DocumentExpander for ContextExpander {
    async fn expand(&self, document: &Value) -> Result<Vec<Value>> {
        expand_document(document)
    }
}

/// Synchronous expansion entry point.
pub fn expand_document(document: &Value) -> Result<Vec<Value>> {
    if !matches!(document, Value::Object(_) | Value::Array(_)) {
        return Err(Error::expansion("document must be an object or an array"));
    }

    let expanded = expand_element(&ActiveContext::default(), None, document)?;
    let expanded = match expanded {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(KW_GRAPH) => {
            map.remove(KW_GRAPH).unwrap_or(Value::Null)
        }
        other => other,
    };

    Ok(match expanded {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    })
}

const KW_CONTEXT: &str = "@context";
const KW_GRAPH: &str = "@graph";
const KW_ID: &str = "@id";
const KW_TYPE: &str = "@type";
const KW_VALUE: &str = "@value";
const KW_LANGUAGE: &str = "@language";
const KW_LIST: &str = "@list";
const KW_SET: &str = "@set";
const KW_INDEX: &str = "@index";
const KW_VOCAB: &str = "@vocab";

const KEYWORDS: &[&str] = &[
    "@base", KW_CONTEXT, "@container", KW_GRAPH, KW_ID, KW_INDEX, KW_LANGUAGE, KW_LIST,
    "@reverse", KW_SET, KW_TYPE, KW_VALUE, KW_VOCAB,
];

fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

fn is_absolute(iri: &str) -> bool {
    iri.contains(':')
}

#[derive(Clone, Debug, Default)]
struct TermDefinition {
    /// `None` when the term is explicitly mapped to null.
    iri: Option<String>,
    type_mapping: Option<String>,
    container: Option<String>,
    /// `Some(None)` resets the default language for this term.
    language: Option<Option<String>>,
}

#[derive(Clone, Debug, Default)]
struct ActiveContext {
    vocab: Option<String>,
    language: Option<String>,
    terms: HashMap<String, TermDefinition>,
}

impl ActiveContext {
    /// Expand `value` to an IRI. Returns `None` for terms mapped to null.
    fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if vocab {
            if let Some(term) = self.terms.get(value) {
                return term.iri.clone();
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(iri) = self.terms.get(prefix).and_then(|t| t.iri.as_deref()) {
                return Some(format!("{}{}", iri, suffix));
            }
            return Some(value.to_string());
        }
        match (&self.vocab, vocab) {
            (Some(base), true) => Some(format!("{}{}", base, value)),
            _ => Some(value.to_string()),
        }
    }

    fn term(&self, key: &str) -> Option<&TermDefinition> {
        self.terms.get(key)
    }

    fn process(&self, local: &Value) -> Result<ActiveContext> {
        match local {
            Value::Array(contexts) => contexts
                .iter()
                .try_fold(self.clone(), |active, context| active.process(context)),
            Value::Null => Ok(ActiveContext::default()),
            Value::String(url) => Err(Error::expansion(format!(
                "remote context {} cannot be loaded",
                url
            ))),
            Value::Object(map) => {
                let mut active = self.clone();
                active.apply_local(map)?;
                Ok(active)
            }
            _ => Err(Error::expansion("invalid local context")),
        }
    }

    fn apply_local(&mut self, local: &JsonMap) -> Result<()> {
        match local.get(KW_VOCAB) {
            None => {}
            Some(Value::Null) => self.vocab = None,
            Some(Value::String(v)) if is_absolute(v) => self.vocab = Some(v.clone()),
            Some(_) => return Err(Error::expansion("invalid vocab mapping")),
        }
        match local.get(KW_LANGUAGE) {
            None => {}
            Some(Value::Null) => self.language = None,
            Some(Value::String(lang)) => self.language = Some(lang.to_lowercase()),
            Some(_) => return Err(Error::expansion("invalid default language")),
        }

        let mut defined = HashMap::new();
        for term in local.keys() {
            if term == KW_VOCAB || term == KW_LANGUAGE || term == "@base" {
                continue;
            }
            self.define_term(local, term, &mut defined)?;
        }
        Ok(())
    }

    fn define_term(
        &mut self,
        local: &JsonMap,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<()> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(Error::expansion(format!("cyclic IRI mapping for {}", term)))
            }
            None => {}
        }
        defined.insert(term.to_string(), false);

        if is_keyword(term) {
            return Err(Error::expansion(format!("keyword redefinition: {}", term)));
        }
        self.terms.remove(term);

        let definition = match local.get(term) {
            None | Some(Value::Null) => TermDefinition::default(),
            Some(Value::String(id)) => TermDefinition {
                iri: self.expand_in_local(local, id, defined)?,
                ..Default::default()
            },
            Some(Value::Object(body)) => self.expanded_definition(local, term, body, defined)?,
            Some(_) => {
                return Err(Error::expansion(format!("invalid term definition: {}", term)))
            }
        };

        if let Some(iri) = &definition.iri {
            if !is_keyword(iri) && !is_absolute(iri) {
                return Err(Error::expansion(format!("invalid IRI mapping for {}", term)));
            }
        }

        self.terms.insert(term.to_string(), definition);
        defined.insert(term.to_string(), true);
        Ok(())
    }

    fn expanded_definition(
        &mut self,
        local: &JsonMap,
        term: &str,
        body: &JsonMap,
        defined: &mut HashMap<String, bool>,
    ) -> Result<TermDefinition> {
        if body.contains_key("@reverse") {
            return Err(Error::expansion("reverse properties are not supported"));
        }

        let mut definition = TermDefinition::default();

        definition.iri = match body.get(KW_ID) {
            Some(Value::Null) => None,
            Some(Value::String(id)) => self.expand_in_local(local, id, defined)?,
            Some(_) => return Err(Error::expansion(format!("invalid IRI mapping for {}", term))),
            None => match term.split_once(':') {
                Some((prefix, _)) => {
                    if local.contains_key(prefix) {
                        self.define_term(local, prefix, defined)?;
                    }
                    self.expand_iri(term, false)
                }
                None => match &self.vocab {
                    Some(vocab) => Some(format!("{}{}", vocab, term)),
                    None => {
                        return Err(Error::expansion(format!("invalid IRI mapping for {}", term)))
                    }
                },
            },
        };

        if let Some(kind) = body.get(KW_TYPE) {
            let kind = kind
                .as_str()
                .ok_or_else(|| Error::expansion(format!("invalid type mapping for {}", term)))?;
            let kind = self.expand_in_local(local, kind, defined)?.unwrap_or_default();
            if kind != KW_ID && kind != KW_VOCAB && !is_absolute(&kind) {
                return Err(Error::expansion(format!("invalid type mapping for {}", term)));
            }
            definition.type_mapping = Some(kind);
        }

        if let Some(container) = body.get("@container") {
            match container.as_str() {
                Some(c @ (KW_LIST | KW_SET | KW_LANGUAGE | KW_INDEX)) => {
                    definition.container = Some(c.to_string())
                }
                _ => return Err(Error::expansion(format!("invalid container mapping for {}", term))),
            }
        }

        match body.get(KW_LANGUAGE) {
            None => {}
            Some(Value::Null) => definition.language = Some(None),
            Some(Value::String(lang)) => definition.language = Some(Some(lang.to_lowercase())),
            Some(_) => return Err(Error::expansion(format!("invalid language mapping for {}", term))),
        }

        Ok(definition)
    }

    // IRI expansion while a local context is being processed: terms the
    // value depends on are defined first.
    fn expand_in_local(
        &mut self,
        local: &JsonMap,
        value: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<Option<String>> {
        if local.contains_key(value) && defined.get(value) != Some(&true) {
            self.define_term(local, value, defined)?;
        }
        if let Some((prefix, _)) = value.split_once(':') {
            if local.contains_key(prefix) && defined.get(prefix) != Some(&true) {
                self.define_term(local, prefix, defined)?;
            }
        }
        Ok(self.expand_iri(value, true))
    }
}

fn is_free_floating(property: Option<&str>) -> bool {
    matches!(property, None | Some(KW_GRAPH))
}

fn expand_element(active: &ActiveContext, property: Option<&str>, element: &Value) -> Result<Value> {
    match element {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => {
            let in_list = property
                .and_then(|p| active.term(p))
                .and_then(|t| t.container.as_deref())
                == Some(KW_LIST);
            let mut out = Vec::new();
            for item in items {
                match expand_element(active, property, item)? {
                    Value::Null => {}
                    Value::Array(nested) => {
                        if in_list {
                            return Err(Error::expansion("list of lists"));
                        }
                        out.extend(nested);
                    }
                    other => out.push(other),
                }
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => expand_object(active, property, map),
        scalar => match property {
            Some(p) if !is_free_floating(property) => Ok(expand_value(active, p, scalar)),
            _ => Ok(Value::Null),
        },
    }
}

fn expand_object(active: &ActiveContext, property: Option<&str>, map: &JsonMap) -> Result<Value> {
    let active: Cow<'_, ActiveContext> = match map.get(KW_CONTEXT) {
        Some(local) => Cow::Owned(active.process(local)?),
        None => Cow::Borrowed(active),
    };

    let mut keys: Vec<&String> = map.keys().filter(|k| *k != KW_CONTEXT).collect();
    keys.sort();

    let mut result = Map::new();
    for key in keys {
        let value = &map[key.as_str()];
        let Some(expanded) = active.expand_iri(key, true) else {
            continue;
        };

        if is_keyword(&expanded) {
            if result.contains_key(&expanded) {
                return Err(Error::expansion(format!("colliding keywords: {}", expanded)));
            }
            if let Some(v) = expand_keyword(&active, property, &expanded, value)? {
                result.insert(expanded, v);
            }
            continue;
        }
        if !is_absolute(&expanded) {
            continue;
        }

        let term = active.term(key);
        let container = term.and_then(|t| t.container.as_deref());

        let mut expanded_value = match (container, value) {
            (Some(KW_LANGUAGE), Value::Object(langs)) => expand_language_map(langs)?,
            _ => expand_element(&active, Some(key), value)?,
        };
        if expanded_value.is_null() {
            continue;
        }
        if container == Some(KW_LIST) && !is_list_object(&expanded_value) {
            expanded_value = serde_json::json!({ "@list": as_array(expanded_value) });
        }

        match result.entry(expanded).or_insert_with(|| Value::Array(Vec::new())) {
            Value::Array(items) => items.extend(as_array(expanded_value)),
            _ => return Err(Error::expansion("colliding property values")),
        }
    }

    finish_object(property, result)
}

fn expand_keyword(
    active: &ActiveContext,
    property: Option<&str>,
    keyword: &str,
    value: &Value,
) -> Result<Option<Value>> {
    let expanded = match keyword {
        KW_ID => {
            let id = value
                .as_str()
                .ok_or_else(|| Error::expansion("@id value must be a string"))?;
            active.expand_iri(id, false).map(Value::String).unwrap_or(Value::Null)
        }
        KW_TYPE => match value {
            Value::String(t) => Value::from(active.expand_iri(t, true)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|t| {
                        t.as_str()
                            .map(|t| Value::from(active.expand_iri(t, true)))
                            .ok_or_else(|| Error::expansion("invalid type value"))
                    })
                    .collect::<Result<_>>()?,
            ),
            _ => return Err(Error::expansion("invalid type value")),
        },
        KW_GRAPH => Value::Array(as_array(expand_element(active, Some(KW_GRAPH), value)?)),
        KW_VALUE => {
            if value.is_object() || value.is_array() {
                return Err(Error::expansion("invalid value object value"));
            }
            value.clone()
        }
        KW_LANGUAGE => {
            let lang = value
                .as_str()
                .ok_or_else(|| Error::expansion("invalid language-tagged string"))?;
            Value::from(lang.to_lowercase())
        }
        KW_INDEX => {
            if !value.is_string() {
                return Err(Error::expansion("invalid @index value"));
            }
            value.clone()
        }
        KW_LIST => {
            if is_free_floating(property) {
                return Ok(None);
            }
            let items = as_array(expand_element(active, property, value)?);
            if items.iter().any(is_list_object) {
                return Err(Error::expansion("list of lists"));
            }
            Value::Array(items)
        }
        KW_SET => expand_element(active, property, value)?,
        "@reverse" => return Err(Error::expansion("reverse properties are not supported")),
        _ => return Ok(None),
    };
    Ok(Some(expanded))
}

fn expand_language_map(langs: &JsonMap) -> Result<Value> {
    let mut keys: Vec<&String> = langs.keys().collect();
    keys.sort();
    let mut out = Vec::new();
    for lang in keys {
        let values = match &langs[lang.as_str()] {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            single => vec![single],
        };
        for v in values {
            let text = v
                .as_str()
                .ok_or_else(|| Error::expansion("invalid language map value"))?;
            out.push(serde_json::json!({ "@value": text, "@language": lang.to_lowercase() }));
        }
    }
    Ok(Value::Array(out))
}

fn expand_value(active: &ActiveContext, property: &str, value: &Value) -> Value {
    let term = active.term(property);
    let type_mapping = term.and_then(|t| t.type_mapping.as_deref());

    if let (Some(mapping @ (KW_ID | KW_VOCAB)), Value::String(iri)) = (type_mapping, value) {
        let id = active.expand_iri(iri, mapping == KW_VOCAB);
        return serde_json::json!({ "@id": id });
    }

    let mut out = Map::new();
    out.insert(KW_VALUE.into(), value.clone());
    match type_mapping {
        Some(datatype) if datatype != KW_ID && datatype != KW_VOCAB => {
            out.insert(KW_TYPE.into(), Value::from(datatype));
        }
        _ => {
            let language = match term.and_then(|t| t.language.as_ref()) {
                Some(explicit) => explicit.clone(),
                None => active.language.clone(),
            };
            if let (Some(lang), true) = (language, value.is_string()) {
                out.insert(KW_LANGUAGE.into(), Value::from(lang));
            }
        }
    }
    Value::Object(out)
}

fn finish_object(property: Option<&str>, mut result: JsonMap) -> Result<Value> {
    if result.contains_key(KW_VALUE) {
        if result
            .keys()
            .any(|k| !matches!(k.as_str(), KW_VALUE | KW_LANGUAGE | KW_TYPE | KW_INDEX))
        {
            return Err(Error::expansion("invalid value object"));
        }
        if result[KW_VALUE].is_null() {
            return Ok(Value::Null);
        }
        if result.contains_key(KW_LANGUAGE) && !result[KW_VALUE].is_string() {
            return Err(Error::expansion("invalid language-tagged value"));
        }
    } else if let Some(types) = result.get_mut(KW_TYPE) {
        if !types.is_array() {
            *types = Value::Array(vec![types.take()]);
        }
    } else if result.contains_key(KW_SET) || result.contains_key(KW_LIST) {
        if result.keys().any(|k| k != KW_SET && k != KW_LIST && k != KW_INDEX) {
            return Err(Error::expansion("invalid set or list object"));
        }
        if let Some(set) = result.remove(KW_SET) {
            return Ok(set);
        }
    }

    if result.len() == 1 && result.contains_key(KW_LANGUAGE) {
        return Ok(Value::Null);
    }

    if is_free_floating(property) {
        let only_id = result.len() == 1 && result.contains_key(KW_ID);
        if result.is_empty() || result.contains_key(KW_VALUE) || result.contains_key(KW_LIST) || only_id {
            return Ok(Value::Null);
        }
    }

    Ok(Value::Object(result))
}

fn is_list_object(value: &Value) -> bool {
    value.get(KW_LIST).is_some()
}

fn as_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ODRL: &str = "http://www.w3.org/ns/odrl/2/";

    fn context() -> Value {
        json!({
            "id": "http://openpermissions.org/ns/id/",
            "ol": "http://openpermissions.org/ns/op/1.1/",
            "@vocab": ODRL
        })
    }

    #[test]
    fn expands_vocab_and_prefixes() {
        let doc = json!({
            "@context": context(),
            "@graph": [{
                "@id": "id:perm1",
                "@type": ["Permission", "ol:Policy"],
                "action": {"@id": "ol:display"}
            }]
        });
        let out = expand_document(&doc).unwrap();
        assert_eq!(
            out,
            vec![json!({
                "@id": "http://openpermissions.org/ns/id/perm1",
                "@type": [
                    "http://www.w3.org/ns/odrl/2/Permission",
                    "http://openpermissions.org/ns/op/1.1/Policy"
                ],
                "http://www.w3.org/ns/odrl/2/action": [
                    {"@id": "http://openpermissions.org/ns/op/1.1/display"}
                ]
            })]
        );
    }

    #[test]
    fn type_string_becomes_array() {
        let doc = json!({"@context": context(), "@id": "id:x", "@type": "Offer"});
        let out = expand_document(&doc).unwrap();
        assert_eq!(out[0]["@type"], json!(["http://www.w3.org/ns/odrl/2/Offer"]));
    }

    #[test]
    fn scalars_become_value_objects() {
        let doc = json!({
            "@context": {"@vocab": ODRL, "@language": "EN"},
            "@id": "http://x/1",
            "title": "Hello",
            "count": 3
        });
        let out = expand_document(&doc).unwrap();
        assert_eq!(out[0][format!("{ODRL}title")], json!([{"@value": "Hello", "@language": "en"}]));
        assert_eq!(out[0][format!("{ODRL}count")], json!([{"@value": 3}]));
    }

    #[test]
    fn typed_terms_coerce_values() {
        let doc = json!({
            "@context": {
                "ol": "http://openpermissions.org/ns/op/1.1/",
                "fromSet": {"@id": "ol:fromSet", "@type": "@id"},
                "count": {"@id": "ol:count", "@type": "http://www.w3.org/2001/XMLSchema#integer"}
            },
            "@id": "http://x/t",
            "fromSet": "ol:set1",
            "count": "2"
        });
        let out = expand_document(&doc).unwrap();
        assert_eq!(
            out[0]["http://openpermissions.org/ns/op/1.1/fromSet"],
            json!([{"@id": "http://openpermissions.org/ns/op/1.1/set1"}])
        );
        assert_eq!(
            out[0]["http://openpermissions.org/ns/op/1.1/count"],
            json!([{"@value": "2", "@type": "http://www.w3.org/2001/XMLSchema#integer"}])
        );
    }

    #[test]
    fn language_container_expands_map() {
        let doc = json!({
            "@context": {"label": {"@id": "http://x/label", "@container": "@language"}},
            "@id": "http://x/1",
            "label": {"fr": "Bonjour", "en": ["Hello"]}
        });
        let out = expand_document(&doc).unwrap();
        assert_eq!(
            out[0]["http://x/label"],
            json!([
                {"@value": "Hello", "@language": "en"},
                {"@value": "Bonjour", "@language": "fr"}
            ])
        );
    }

    #[test]
    fn list_container_wraps_values() {
        let doc = json!({
            "@context": {"seq": {"@id": "http://x/seq", "@container": "@list"}},
            "@id": "http://x/1",
            "seq": [1, 2]
        });
        let out = expand_document(&doc).unwrap();
        assert_eq!(out[0]["http://x/seq"], json!([{"@list": [{"@value": 1}, {"@value": 2}]}]));
    }

    #[test]
    fn unmapped_properties_are_dropped() {
        let doc = json!({"@context": {"id": "http://x/"}, "@id": "http://x/1", "@type": ["http://x/T"], "loose": 1});
        let out = expand_document(&doc).unwrap();
        assert!(out[0].get("loose").is_none());
    }

    #[test]
    fn already_expanded_input_passes_through() {
        let doc = json!([{
            "@id": "http://x/1",
            "@type": ["http://www.w3.org/ns/odrl/2/Offer"],
            "http://www.w3.org/ns/odrl/2/permission": [{"@id": "http://x/p"}]
        }]);
        let out = expand_document(&doc).unwrap();
        assert_eq!(Value::Array(out), doc);
    }

    #[test]
    fn context_without_graph_expands_to_nothing() {
        let doc = json!({"@context": context()});
        assert!(expand_document(&doc).unwrap().is_empty());
    }

    #[test]
    fn free_floating_values_are_dropped() {
        let doc = json!({"@context": context(), "@graph": [{"@id": "id:only"}, {"@value": 1}, {}, "text"]});
        assert!(expand_document(&doc).unwrap().is_empty());
    }

    #[test]
    fn non_document_is_an_error() {
        let err = expand_document(&json!("invalid data")).unwrap_err();
        assert!(matches!(err, Error::Expansion(_)));
    }

    #[test]
    fn remote_context_is_an_error() {
        let doc = json!({"@context": "http://example.org/context.jsonld", "@id": "http://x/1"});
        assert!(matches!(expand_document(&doc), Err(Error::Expansion(_))));
    }

    #[test]
    fn cyclic_terms_are_an_error() {
        let doc = json!({"@context": {"a": "b:x", "b": "a:y"}, "@id": "http://x/1"});
        assert!(matches!(expand_document(&doc), Err(Error::Expansion(_))));
    }

    #[test]
    fn null_context_resets_terms() {
        let doc = json!({
            "@context": [context(), null],
            "@id": "http://x/1",
            "@type": ["http://x/T"],
            "action": "use"
        });
        let out = expand_document(&doc).unwrap();
        assert!(out[0].get(format!("{ODRL}action")).is_none());
    }

    #[tokio::test]
    async fn expander_trait_delegates() {
        let expander: &dyn DocumentExpander = &ContextExpander;
        let out = expander
            .expand(&json!([{"@id": "http://x/1", "@type": ["http://x/T"]}]))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
    }
}
