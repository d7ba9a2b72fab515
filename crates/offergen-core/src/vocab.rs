//! RDF vocabulary used by offer documents.
//!
//! Every data key of a node is a fully-qualified IRI in one of four
//! namespaces. The id prefixes are defaults only; see `TemplateConfig`.

/// ODRL 2 core namespace.
pub const ODRL_NS: &str = "http://www.w3.org/ns/odrl/2/";
/// Open Permissions Platform extension namespace.
pub const OP_NS: &str = "http://openpermissions.org/ns/op/1.1/";
/// Open Permissions expression extension namespace.
pub const OPEX_NS: &str = "http://openpermissions.org/ns/opex/1.0/";
/// Dublin Core terms.
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

/// Prefix of ids minted by the system of record.
pub const ID_PREFIX: &str = "http://openpermissions.org/ns/id/";
/// Prefix of every id while a template is being edited.
pub const TEMP_ID_PREFIX: &str = "http://openpermissions.org/ns/temporary_id/";

// JSON-LD keywords
pub const KW_ID: &str = "@id";
pub const KW_TYPE: &str = "@type";
pub const KW_VALUE: &str = "@value";
pub const KW_LANGUAGE: &str = "@language";
pub const KW_CONTEXT: &str = "@context";
pub const KW_GRAPH: &str = "@graph";

// Classes
pub const ODRL_OFFER: &str = "http://www.w3.org/ns/odrl/2/Offer";
pub const ODRL_POLICY: &str = "http://www.w3.org/ns/odrl/2/Policy";
pub const ODRL_ASSET: &str = "http://www.w3.org/ns/odrl/2/Asset";
pub const ODRL_RULE: &str = "http://www.w3.org/ns/odrl/2/Rule";
pub const ODRL_PERMISSION: &str = "http://www.w3.org/ns/odrl/2/Permission";
pub const ODRL_PROHIBITION: &str = "http://www.w3.org/ns/odrl/2/Prohibition";
pub const ODRL_DUTY: &str = "http://www.w3.org/ns/odrl/2/Duty";
pub const ODRL_CONSTRAINT: &str = "http://www.w3.org/ns/odrl/2/Constraint";
pub const OP_POLICY: &str = "http://openpermissions.org/ns/op/1.1/Policy";
pub const OP_ASSET: &str = "http://openpermissions.org/ns/op/1.1/Asset";
pub const OP_ASSET_SELECTOR: &str = "http://openpermissions.org/ns/op/1.1/AssetSelector";
pub const OPEX_CONSTRAINT: &str = "http://openpermissions.org/ns/opex/1.0/Constraint";

// Relationship keys (parent → child references)
pub const ODRL_PERMISSION_KEY: &str = "http://www.w3.org/ns/odrl/2/permission";
pub const ODRL_PROHIBITION_KEY: &str = "http://www.w3.org/ns/odrl/2/prohibition";
pub const ODRL_CONSTRAINT_KEY: &str = "http://www.w3.org/ns/odrl/2/constraint";
pub const ODRL_DUTY_KEY: &str = "http://www.w3.org/ns/odrl/2/duty";
pub const ODRL_TARGET_KEY: &str = "http://www.w3.org/ns/odrl/2/target";

// Offer properties
pub const ODRL_PROFILE: &str = "http://www.w3.org/ns/odrl/2/profile";
pub const ODRL_UNDEFINED: &str = "http://www.w3.org/ns/odrl/2/undefined";
pub const ODRL_INHERIT_ALLOWED: &str = "http://www.w3.org/ns/odrl/2/inheritAllowed";
pub const ODRL_TYPE: &str = "http://www.w3.org/ns/odrl/2/type";
pub const ODRL_CONFLICT: &str = "http://www.w3.org/ns/odrl/2/conflict";
pub const ODRL_INVALID: &str = "http://www.w3.org/ns/odrl/2/invalid";
pub const DCTERMS_TITLE: &str = "http://purl.org/dc/terms/title";
pub const OP_POLICY_DESCRIPTION: &str = "http://openpermissions.org/ns/op/1.1/policyDescription";
pub const OP_POLICY_TEXT: &str = "http://openpermissions.org/ns/op/1.1/policyText";

// Rule / constraint / target properties
pub const ODRL_ACTION: &str = "http://www.w3.org/ns/odrl/2/action";
pub const ODRL_OPERATOR: &str = "http://www.w3.org/ns/odrl/2/operator";
pub const ODRL_UNIT: &str = "http://www.w3.org/ns/odrl/2/unit";
pub const OP_COUNT: &str = "http://openpermissions.org/ns/op/1.1/count";
pub const OP_FROM_SET: &str = "http://openpermissions.org/ns/op/1.1/fromSet";

/// Qualify a local name in the ODRL namespace.
pub fn odrl(local: &str) -> String {
    format!("{}{}", ODRL_NS, local)
}

/// Qualify a local name in the platform namespace.
pub fn op(local: &str) -> String {
    format!("{}{}", OP_NS, local)
}

/// Input widget used to edit a constraint operand's value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperandInput {
    TextInput,
    IntegerInput,
    NonNegativeIntegerInput,
    DecimalInput,
    DatetimeInput,
    SpatialDropdown,
}

/// A recognised constraint operand: the data key it is stored under, a
/// display label and the widget that edits its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ConstraintOperand {
    pub key: &'static str,
    pub label: &'static str,
    pub input: OperandInput,
}

const fn operand(key: &'static str, label: &'static str, input: OperandInput) -> ConstraintOperand {
    ConstraintOperand { key, label, input }
}

/// The closed set of operand keys a constraint may carry. A constraint holds
/// at most one of these at a time.
pub const CONSTRAINT_OPERANDS: &[ConstraintOperand] = &[
    operand("http://www.w3.org/ns/odrl/2/absolutePosition", "Absolute Position", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/count", "Count", OperandInput::NonNegativeIntegerInput),
    operand("http://www.w3.org/ns/odrl/2/dateTime", "Date Time", OperandInput::DatetimeInput),
    operand("http://www.w3.org/ns/odrl/2/deliveryChannel", "Delivery Channel", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/device", "Device", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/elapsedTime", "Elapsed Time", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/event", "Event", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/fileFormat", "File Format", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/industry", "Industry", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/language", "Language", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/media", "Media", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/meteredTime", "Metered Time", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/payAmount", "Pay Amount", OperandInput::DecimalInput),
    operand("http://www.w3.org/ns/odrl/2/percentage", "Percentage", OperandInput::DecimalInput),
    operand("http://www.w3.org/ns/odrl/2/product", "Product", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/purpose", "Purpose", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/recipient", "Recipient", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/relativePosition", "Relative Position", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/resolution", "Resolution", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/spatial", "Spatial", OperandInput::SpatialDropdown),
    operand("http://www.w3.org/ns/odrl/2/system", "System", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/timeInterval", "Time Interval", OperandInput::IntegerInput),
    operand("http://www.w3.org/ns/odrl/2/version", "Version", OperandInput::TextInput),
    operand("http://www.w3.org/ns/odrl/2/virtualLocation", "Virtual Location", OperandInput::TextInput),
];

/// Whether `key` is one of the recognised constraint operands.
pub fn is_constraint_operand(key: &str) -> bool {
    CONSTRAINT_OPERANDS.iter().any(|o| o.key == key)
}
