//! Document validation: schema, then required fields, then code lists.
//!
//! Validation is corrective: a required field that is absent but has a
//! registered default gets the default written into the tree. The first
//! failure in the fixed check order is returned.

use serde::Serialize;
use tracing::{debug, info};

use crate::core::FacturXError;
use crate::fields::{self, FIELDS, FieldValue, GroupRegistry};
use crate::flavor::{Flavor, SchemaValidator};
use crate::xml::XmlTree;

/// Outcome of a successful validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// `(field, value)` pairs backfilled from registry defaults, in registry order.
    pub defaults_applied: Vec<(String, String)>,
}

impl ValidationReport {
    /// Whether the pass left the document untouched.
    pub fn is_clean(&self) -> bool {
        self.defaults_applied.is_empty()
    }
}

pub(crate) fn validate(
    tree: &mut XmlTree,
    groups: &mut GroupRegistry,
    flavor: &Flavor,
    schema: &dyn SchemaValidator,
) -> Result<ValidationReport, FacturXError> {
    schema.validate(flavor, tree)?;

    let mut report = ValidationReport::default();
    for spec in FIELDS.iter().filter(|f| f.required) {
        if spec.xpath(flavor).is_none() {
            continue;
        }
        if fields::get(tree, flavor, spec.name)?.is_some() {
            continue;
        }
        let Some(default) = spec.default else {
            return Err(FacturXError::MissingRequiredField(spec.name.to_string()));
        };
        fields::set(tree, groups, flavor, spec.name, &FieldValue::from(default)).map_err(
            |e| match e {
                FacturXError::FieldNotApplicable { field, .. } => {
                    FacturXError::MissingRequiredField(field)
                }
                other => other,
            },
        )?;
        info!(field = spec.name, default, "required field backfilled");
        report
            .defaults_applied
            .push((spec.name.to_string(), default.to_string()));
    }

    for spec in FIELDS {
        let Some(list) = spec.code_list() else {
            continue;
        };
        let codes = flavor.code_list(list);
        for value in fields::get_all(tree, flavor, spec.name)? {
            let code = value.to_string();
            if codes.binary_search(&code.as_str()).is_err() {
                return Err(FacturXError::InvalidCode {
                    field: spec.name.to_string(),
                    value: code,
                    code_type: list,
                });
            }
        }
    }

    debug!(flavor = %flavor, defaults = report.defaults_applied.len(), "validation passed");
    Ok(report)
}
