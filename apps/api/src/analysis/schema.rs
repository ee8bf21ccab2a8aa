//! Analysis Schema — the required shape of a role-partitioned ticket analysis.
//!
//! The shape is declared once as a static field tree. The same tree is rendered
//! into JSON Schema text for the prompt and walked by the coercer to validate
//! model output, so the two can never drift apart.

use serde_json::{json, Map, Value};

/// The JSON type a field must carry.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    Boolean,
    /// Ordered sequence of strings.
    TextList,
    /// Nested record with its own required fields.
    Object(&'static [FieldSpec]),
    /// Ordered sequence of records, each with the given required fields.
    ObjectList(&'static [FieldSpec]),
}

/// One required field in the analysis shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, description: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        description,
        kind,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Developer view
// ────────────────────────────────────────────────────────────────────────────

const DIAGRAM_ANALYSIS: &[FieldSpec] = &[
    field(
        "is_required",
        "True if a visual diagram would clarify a multi-step process or interaction in this ticket.",
        FieldKind::Boolean,
    ),
    field(
        "mermaid_script",
        "If is_required is true, a Mermaid flowchart or sequence diagram script. \
         If false, a short justification of why no diagram is needed.",
        FieldKind::Text,
    ),
];

const DEVELOPER_VIEW: &[FieldSpec] = &[
    field(
        "potential_blockers",
        "Potential technical or logical blockers, dependencies, or risks.",
        FieldKind::TextList,
    ),
    field(
        "complexity",
        "Qualitative development complexity: Low, Medium, or High.",
        FieldKind::Text,
    ),
    field(
        "diagram_analysis",
        "Whether a diagram would help, and the diagram script or justification.",
        FieldKind::Object(DIAGRAM_ANALYSIS),
    ),
];

// ────────────────────────────────────────────────────────────────────────────
// QA view
// ────────────────────────────────────────────────────────────────────────────

const REQUIRED_TESTING: &[FieldSpec] = &[
    field(
        "functional_tests",
        "Functional test cases QA should run.",
        FieldKind::TextList,
    ),
    field(
        "edge_cases",
        "Edge cases and negative scenarios to cover.",
        FieldKind::TextList,
    ),
];

const QA_VIEW: &[FieldSpec] = &[
    field(
        "required_testing",
        "Functional tests and edge cases for QA.",
        FieldKind::Object(REQUIRED_TESTING),
    ),
    field(
        "complexity",
        "Qualitative QA complexity: Low, Medium, or High.",
        FieldKind::Text,
    ),
];

// ────────────────────────────────────────────────────────────────────────────
// Product manager view
// ────────────────────────────────────────────────────────────────────────────

const ACCEPTANCE_CRITERIA_REVIEW: &[FieldSpec] = &[
    field(
        "criteria",
        "An existing or missing acceptance criterion.",
        FieldKind::Text,
    ),
    field(
        "suggestion",
        "How to improve or add this criterion.",
        FieldKind::Text,
    ),
];

const PRODUCT_MANAGER_VIEW: &[FieldSpec] = &[
    field(
        "clarifying_questions",
        "Questions for the product owner to fill in missing details or resolve ambiguities.",
        FieldKind::TextList,
    ),
    field(
        "acceptance_criteria_review",
        "Review of the acceptance criteria, suggesting improvements or new criteria.",
        FieldKind::ObjectList(ACCEPTANCE_CRITERIA_REVIEW),
    ),
];

/// Top-level analysis groups, one per role view.
pub const ANALYSIS_SCHEMA: &[FieldSpec] = &[
    field(
        "developer_view",
        "Analysis from a Senior Developer: feasibility, blockers, implementation detail.",
        FieldKind::Object(DEVELOPER_VIEW),
    ),
    field(
        "qa_view",
        "Analysis from a QA Engineer: testability and edge cases.",
        FieldKind::Object(QA_VIEW),
    ),
    field(
        "product_manager_view",
        "Analysis from a Product Manager: clarity, completeness, business value.",
        FieldKind::Object(PRODUCT_MANAGER_VIEW),
    ),
];

/// Renders `fields` as a JSON Schema object (draft-07 subset).
pub fn json_schema(fields: &[FieldSpec]) -> Value {
    object_schema(fields)
}

fn object_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    for spec in fields {
        let mut node = kind_schema(spec.kind);
        if let Value::Object(obj) = &mut node {
            obj.insert("description".to_string(), json!(spec.description));
        }
        properties.insert(spec.name.to_string(), node);
    }
    let required: Vec<&str> = fields.iter().map(|f| f.name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn kind_schema(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text => json!({ "type": "string" }),
        FieldKind::Boolean => json!({ "type": "boolean" }),
        FieldKind::TextList => json!({ "type": "array", "items": { "type": "string" } }),
        FieldKind::Object(fields) => object_schema(fields),
        FieldKind::ObjectList(fields) => json!({ "type": "array", "items": object_schema(fields) }),
    }
}

/// Machine-readable format instructions embedded in the analysis prompt.
pub fn format_instructions() -> String {
    let schema = serde_json::to_string(&json_schema(ANALYSIS_SCHEMA)).unwrap_or_default();
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
         \n\
         As an example, for the schema {{\"properties\": {{\"foo\": {{\"description\": \"a list of strings\", \"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
         the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema. \
         The object {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not well-formatted.\n\
         \n\
         Here is the output schema:\n\
         ```\n\
         {schema}\n\
         ```"
    )
}
