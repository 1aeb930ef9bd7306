//! Parameter mapping - routes caller input to request locations.
//!
//! Path-level and operation-level parameter definitions are merged by name
//! (operation level wins), references are resolved with local fields taking
//! precedence, and each supplied value is routed by its definition's `in`.
//! Input keys that match no definition are dropped.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::document::{ApiDocument, OperationRef, PATH_PARAMETERS_KEY};
use crate::error::RequestError;
use crate::types::{
    json_type_name, ParameterDef, ParameterLocation, RequestInput, RequestOptions, FORM_PARAMS,
    HEADERS, QUERY,
};

const REF_KEY: &str = "$ref";

/// Output of parameter mapping for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRequest {
    /// Transport options: raw `@http` content plus routed values.
    pub options: RequestOptions,
    /// Values for path template expansion; never sent as an option.
    pub path_params: Map<String, Value>,
}

/// Merge the path-level and operation-level definitions for `op`.
///
/// Keyed by parameter name, last write wins; a name keeps the position of
/// its first declaration.
///
/// # Errors
///
/// Returns reference resolution errors or `RequestError::MalformedParameter`.
pub fn merged_parameters(
    document: &ApiDocument,
    op: OperationRef<'_>,
) -> Result<IndexMap<String, ParameterDef>, RequestError> {
    let path_level = document
        .path_item(op.path)
        .and_then(|item| item.get(PATH_PARAMETERS_KEY));
    let operation_level = op.operation.get(PATH_PARAMETERS_KEY);

    let mut merged = IndexMap::new();
    for source in [path_level, operation_level].into_iter().flatten() {
        let Some(params) = source.as_array() else {
            continue;
        };
        for raw in params {
            let def = resolve_definition(document, raw, op)?;
            merged.insert(def.name.clone(), def);
        }
    }
    Ok(merged)
}

/// Resolve one raw definition, following a `$ref` if present.
///
/// Fields written next to the `$ref` override the referenced definition.
pub fn resolve_definition(
    document: &ApiDocument,
    raw: &Value,
    op: OperationRef<'_>,
) -> Result<ParameterDef, RequestError> {
    let malformed = |message: String| RequestError::MalformedParameter {
        operation: op.label(),
        message,
    };

    let local = raw.as_object().ok_or_else(|| {
        malformed(format!("expected object, got {}", json_type_name(raw)))
    })?;

    let mut fields = match local.get(REF_KEY).and_then(Value::as_str) {
        Some(reference) => {
            let target = document.resolve_ref(reference)?;
            target.as_object().cloned().ok_or_else(|| {
                malformed(format!(
                    "{} points to {}, expected object",
                    reference,
                    json_type_name(target)
                ))
            })?
        }
        None => Map::new(),
    };
    for (key, value) in local {
        if key != REF_KEY {
            fields.insert(key.clone(), value.clone());
        }
    }

    let name = fields
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("parameter has no string \"name\"".to_string()))?
        .to_string();
    let location = fields
        .get("in")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let required = fields
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Ok(ParameterDef {
        name,
        location,
        required,
    })
}

/// Route `input` through the merged definitions of `op`.
///
/// # Errors
///
/// Returns `RequestError::MissingRequiredParameter` for an absent required
/// value, `RequestError::UnrecognizedParameterLocation` for a supplied value
/// whose definition has an unknown `in`, and any error from
/// [`merged_parameters`].
pub fn map_parameters(
    document: &ApiDocument,
    op: OperationRef<'_>,
    mut input: RequestInput,
) -> Result<MappedRequest, RequestError> {
    let mut mapped = MappedRequest {
        options: RequestOptions::from_raw(input.take_raw_options()),
        path_params: Map::new(),
    };

    for def in merged_parameters(document, op)?.into_values() {
        let Some(value) = input.remove(&def.name) else {
            if def.required {
                return Err(RequestError::MissingRequiredParameter {
                    name: def.name,
                    operation: op.label(),
                });
            }
            continue;
        };

        let location = ParameterLocation::parse(&def.location).ok_or_else(|| {
            RequestError::UnrecognizedParameterLocation {
                location: def.location.clone(),
                name: def.name.clone(),
            }
        })?;
        tracing::trace!(name = %def.name, location = %def.location, "routing parameter");

        match location {
            ParameterLocation::Body => mapped.options.set_json(value),
            ParameterLocation::Query => mapped.options.insert_into(QUERY, &def.name, value),
            ParameterLocation::Header => mapped.options.insert_into(HEADERS, &def.name, value),
            ParameterLocation::FormData => {
                mapped.options.insert_into(FORM_PARAMS, &def.name, value)
            }
            ParameterLocation::Path => {
                mapped.path_params.insert(def.name, value);
            }
        }
    }

    Ok(mapped)
}
