//! Document linting - static checks of operations and their parameters.
//!
//! Reports problems that would otherwise only surface when a request is
//! prepared:
//! - unresolvable or cross-document parameter references
//! - parameter definitions without a name or with an unknown `in`
//! - operationIds declared more than once
//! - path parameters not marked required

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::document::{ApiDocument, OperationRef, PATH_PARAMETERS_KEY};
use crate::error::RequestError;
use crate::mapper::resolve_definition;
use crate::types::{ParameterDef, ParameterLocation};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic message from linting.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    /// `METHOD path` of the operation being checked.
    pub operation: String,
    /// JSON pointer to the offending value (e.g., "/paths/~1items/get/parameters/0")
    pub pointer: String,
    pub message: String,
}

/// Result of linting a document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintResult {
    pub operations_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl LintResult {
    /// Returns true if no errors were found.
    pub fn is_ok(&self) -> bool {
        self.errors == 0
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.diagnostics.push(diagnostic);
    }
}

/// Lint every operation of `document`.
pub fn lint(document: &ApiDocument) -> LintResult {
    let mut result = LintResult::default();
    let mut first_declared: HashMap<&str, String> = HashMap::new();

    for op in document.operations() {
        result.operations_checked += 1;

        if let Some(id) = op.operation_id() {
            match first_declared.get(id) {
                Some(first) => result.push(Diagnostic {
                    severity: Severity::Warning,
                    code: "W001".to_string(),
                    operation: op.label(),
                    pointer: format!("{}/operationId", operation_pointer(op)),
                    message: format!(
                        "operationId \"{}\" already declared by {}; the first declaration wins",
                        id, first
                    ),
                }),
                None => {
                    first_declared.insert(id, op.label());
                }
            }
        }

        let shared = document
            .path_item(op.path)
            .and_then(|item| item.get(PATH_PARAMETERS_KEY));
        check_parameters(
            document,
            op,
            shared,
            &format!("{}/{}", path_pointer(op.path), PATH_PARAMETERS_KEY),
            &mut result,
        );
        check_parameters(
            document,
            op,
            op.operation.get(PATH_PARAMETERS_KEY),
            &format!("{}/{}", operation_pointer(op), PATH_PARAMETERS_KEY),
            &mut result,
        );
    }

    result
}

fn check_parameters(
    document: &ApiDocument,
    op: OperationRef<'_>,
    params: Option<&Value>,
    pointer: &str,
    result: &mut LintResult,
) {
    let Some(params) = params.and_then(Value::as_array) else {
        return;
    };

    for (i, raw) in params.iter().enumerate() {
        let pointer = format!("{}/{}", pointer, i);
        match resolve_definition(document, raw, op) {
            Ok(def) => check_definition(&def, op, &pointer, result),
            Err(e) => {
                let code = match e {
                    RequestError::MalformedParameter { .. } => "E002",
                    _ => "E001",
                };
                result.push(Diagnostic {
                    severity: Severity::Error,
                    code: code.to_string(),
                    operation: op.label(),
                    pointer,
                    message: e.to_string(),
                });
            }
        }
    }
}

fn check_definition(
    def: &ParameterDef,
    op: OperationRef<'_>,
    pointer: &str,
    result: &mut LintResult,
) {
    match ParameterLocation::parse(&def.location) {
        None => result.push(Diagnostic {
            severity: Severity::Error,
            code: "E003".to_string(),
            operation: op.label(),
            pointer: pointer.to_string(),
            message: format!(
                "parameter \"{}\" has unknown location \"{}\"",
                def.name, def.location
            ),
        }),
        Some(ParameterLocation::Path) if !def.required => result.push(Diagnostic {
            severity: Severity::Warning,
            code: "W002".to_string(),
            operation: op.label(),
            pointer: pointer.to_string(),
            message: format!("path parameter \"{}\" is not marked required", def.name),
        }),
        Some(_) => {}
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn path_pointer(path: &str) -> String {
    format!("/paths/{}", escape(path))
}

fn operation_pointer(op: OperationRef<'_>) -> String {
    format!("{}/{}", path_pointer(op.path), escape(op.method))
}
