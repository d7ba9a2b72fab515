//! Entity factory: typed node wrappers with their default data and the
//! field schema the UI layer edits them through.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::types::{get_path, id_ref, literal, ref_id, EntityKind, FieldPath, JsonMap};
use crate::vocab::*;

/// Widget class for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiClass {
    TextInput,
    TextArea,
    IntegerInput,
    ActionDropdown,
    OperatorDropdown,
    UnitDropdown,
    OdrlList,
}

/// Describes one user-editable location in a node's data.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub key: FieldPath,
    /// For list fields: the kind of child that may be attached here.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub child: Option<EntityKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    pub ui_class: UiClass,
    pub required: bool,
    pub mutable: bool,
}

impl Field {
    fn input(key: [&str; 3], title: &'static str, ui_class: UiClass, required: bool) -> Self {
        Self {
            key: FieldPath::new(key),
            child: None,
            title: Some(title),
            placeholder: None,
            ui_class,
            required,
            mutable: true,
        }
    }

    fn list(child: EntityKind) -> Self {
        Self {
            key: FieldPath::from(child.relation_key().unwrap_or_default()),
            child: Some(child),
            title: None,
            placeholder: None,
            ui_class: UiClass::OdrlList,
            required: false,
            mutable: true,
        }
    }

    fn placeholder(mut self, text: &'static str) -> Self {
        self.placeholder = Some(text);
        self
    }
}

/// Field schema for a kind.
pub fn fields_for(kind: EntityKind) -> Vec<Field> {
    match kind {
        EntityKind::Offer => vec![
            Field::input([DCTERMS_TITLE, "0", KW_VALUE], "Title", UiClass::TextInput, true)
                .placeholder("Title"),
            Field::input(
                [OP_POLICY_DESCRIPTION, "0", KW_VALUE],
                "Policy Description",
                UiClass::TextArea,
                true,
            )
            .placeholder("Description"),
            Field::input([OP_POLICY_TEXT, "0", KW_VALUE], "Policy Text", UiClass::TextArea, false)
                .placeholder("Text"),
            Field::list(EntityKind::Permission),
            Field::list(EntityKind::Prohibition),
            Field::list(EntityKind::Target),
            Field::list(EntityKind::Duty),
        ],
        EntityKind::Permission | EntityKind::Prohibition | EntityKind::Duty => rule_fields(kind),
        EntityKind::Constraint => vec![
            Field::input([ODRL_OPERATOR, "0", KW_ID], "Operator", UiClass::OperatorDropdown, true),
            Field::input([ODRL_UNIT, "0", KW_ID], "Unit", UiClass::UnitDropdown, false),
        ],
        EntityKind::Target => vec![
            Field::input([OP_COUNT, "0", KW_VALUE], "Count", UiClass::IntegerInput, true),
            Field::input([OP_FROM_SET, "0", KW_ID], "Set", UiClass::TextInput, true),
        ],
    }
}

// Only permissions carry their own duties; duties and prohibitions stop at
// constraints.
fn rule_fields(kind: EntityKind) -> Vec<Field> {
    let mut fields = vec![
        Field::input([ODRL_ACTION, "0", KW_ID], "Action", UiClass::ActionDropdown, true),
        Field::list(EntityKind::Constraint),
    ];
    if kind == EntityKind::Permission {
        fields.push(Field::list(EntityKind::Duty));
    }
    fields
}

/// A graph node: its JSON-LD data plus the schema describing how to edit it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(skip)]
    kind: EntityKind,
    ui_class: &'static str,
    fields: Vec<Field>,
    data: JsonMap,
}

impl Node {
    /// Wrap existing data. The data is stored verbatim.
    pub fn with_data(kind: EntityKind, data: JsonMap) -> Self {
        Self {
            kind,
            ui_class: kind.ui_class(),
            fields: fields_for(kind),
            data,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.data.get(KW_ID).and_then(Value::as_str)
    }

    pub fn ui_class(&self) -> &'static str {
        self.ui_class
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn data(&self) -> &JsonMap {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut JsonMap {
        &mut self.data
    }

    /// Read a value by path, e.g. a field key.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        get_path(&self.data, path)
    }

    /// Whether the schema declares a list field for `child`.
    pub fn accepts(&self, child: EntityKind) -> bool {
        self.fields.iter().any(|f| f.child == Some(child))
    }

    /// Ids referenced under `key`.
    pub fn references<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.data
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(ref_id)
    }
}

/// Builds nodes, minting fresh ids under the temporary namespace.
#[derive(Clone, Debug)]
pub struct EntityFactory {
    temp_id_prefix: String,
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::new(TEMP_ID_PREFIX)
    }
}

impl EntityFactory {
    pub fn new(temp_id_prefix: impl Into<String>) -> Self {
        Self {
            temp_id_prefix: temp_id_prefix.into(),
        }
    }

    /// A new id: the temporary prefix followed by 32 hex digits.
    pub fn fresh_id(&self) -> String {
        format!("{}{}", self.temp_id_prefix, Uuid::new_v4().simple())
    }

    /// Build a node of `kind` from `data`, or from the kind's default data
    /// under a fresh id.
    pub fn create(&self, kind: EntityKind, data: Option<JsonMap>) -> Node {
        let data = data.unwrap_or_else(|| self.default_data(kind));
        Node::with_data(kind, data)
    }

    fn default_data(&self, kind: EntityKind) -> JsonMap {
        let id = Value::from(self.fresh_id());
        match kind {
            EntityKind::Offer => object([
                (ODRL_PROFILE, Value::from(OP_NS)),
                (ODRL_UNDEFINED, json!([id_ref(ODRL_INVALID)])),
                (KW_TYPE, json!([ODRL_OFFER, ODRL_POLICY, OP_POLICY, ODRL_ASSET])),
                (ODRL_INHERIT_ALLOWED, json!([literal(false)])),
                (KW_ID, id),
                (ODRL_TYPE, json!([{ "@language": "en", "@value": "offer" }])),
                (ODRL_CONFLICT, json!([id_ref(ODRL_INVALID)])),
            ]),
            EntityKind::Permission | EntityKind::Prohibition | EntityKind::Duty => object([
                (ODRL_ACTION, json!([id_ref("")])),
                (KW_ID, id),
                (KW_TYPE, json!([ODRL_RULE, rule_class(kind)])),
            ]),
            EntityKind::Constraint => object([
                (KW_ID, id),
                (KW_TYPE, json!([ODRL_CONSTRAINT, OPEX_CONSTRAINT])),
            ]),
            EntityKind::Target => object([
                (KW_ID, id),
                (KW_TYPE, json!([ODRL_ASSET, OP_ASSET, OP_ASSET_SELECTOR])),
                (OP_COUNT, json!([literal(1)])),
                (OP_FROM_SET, json!([id_ref("")])),
            ]),
        }
    }
}

fn rule_class(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Permission => ODRL_PERMISSION,
        EntityKind::Prohibition => ODRL_PROHIBITION,
        _ => ODRL_DUTY,
    }
}

fn object<const N: usize>(entries: [(&str, Value); N]) -> JsonMap {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
