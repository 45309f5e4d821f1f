//! Flattened field export (JSON / YAML) and standalone XML output.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::core::FacturXError;
use crate::document::FacturXDocument;
use crate::fields::FIELDS;

/// One exported field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExportValue {
    Single(String),
    /// Every occurrence of a repeating-group field.
    Repeated(Vec<String>),
}

/// Output format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Xml,
    Yaml,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, FacturXError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            "yml" | "yaml" => Ok(Self::Yaml),
            _ => Err(FacturXError::UnsupportedExportFormat(
                path.display().to_string(),
            )),
        }
    }
}

impl FacturXDocument {
    /// All fields the active flavor carries, keyed by field name.
    ///
    /// Validates first (so defaults are backfilled); absent fields are
    /// left out.
    pub fn field_map(&mut self) -> Result<BTreeMap<String, ExportValue>, FacturXError> {
        self.validate()?;
        let flavor = self.flavor();
        let mut map = BTreeMap::new();
        for spec in FIELDS.iter().filter(|f| f.xpath(&flavor).is_some()) {
            let value = if spec.group.is_some() {
                let all: Vec<String> = self
                    .get_all(spec.name)?
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                if all.is_empty() {
                    continue;
                }
                ExportValue::Repeated(all)
            } else {
                match self.get(spec.name)? {
                    Some(v) => ExportValue::Single(v.to_string()),
                    None => continue,
                }
            };
            map.insert(spec.name.to_string(), value);
        }
        Ok(map)
    }

    pub fn to_json(&mut self) -> Result<String, FacturXError> {
        let map = self.field_map()?;
        serde_json::to_string_pretty(&map).map_err(|e| FacturXError::Export(e.to_string()))
    }

    pub fn to_yaml(&mut self) -> Result<String, FacturXError> {
        let map = self.field_map()?;
        serde_yaml::to_string(&map).map_err(|e| FacturXError::Export(e.to_string()))
    }

    /// Write the invoice XML on its own, after validation.
    pub fn write_xml(&mut self, path: impl AsRef<Path>) -> Result<(), FacturXError> {
        self.validate()?;
        std::fs::write(path, self.xml_bytes()?)?;
        Ok(())
    }

    pub fn write_json(&mut self, path: impl AsRef<Path>) -> Result<(), FacturXError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn write_yaml(&mut self, path: impl AsRef<Path>) -> Result<(), FacturXError> {
        let yaml = self.to_yaml()?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Export to `path`, picking the format from its extension.
    pub fn export(&mut self, path: impl AsRef<Path>) -> Result<ExportFormat, FacturXError> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path)?;
        match format {
            ExportFormat::Json => self.write_json(path)?,
            ExportFormat::Xml => self.write_xml(path)?,
            ExportFormat::Yaml => self.write_yaml(path)?,
        }
        info!(path = %path.display(), ?format, "exported");
        Ok(format)
    }
}
