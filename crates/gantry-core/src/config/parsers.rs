//! Built-in configuration parsers

use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{ConfigError, Result};
use crate::model::Model;

use super::ConfigParser;

fn read_to_string(reader: &mut dyn Read) -> Result<String> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(ConfigError::Io)?;
    Ok(content)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(&e))
}

/// Flatten a JSON value into dotted key/value pairs, scalars only
fn flatten_value(prefix: &str, value: &serde_json::Value, out: &mut IndexMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, nested) in map {
                let full = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_value(&full, nested, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(&format!("{}[{}]", prefix, i), item, out);
            }
        }
        serde_json::Value::Null => {}
        serde_json::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        other => {
            out.insert(prefix.to_string(), other.to_string());
        }
    }
}

fn finalize(mut model: Model) -> Model {
    model.finalize();
    model
}

/// TOML configuration parser
pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["toml"])
    }

    fn parse(&self, reader: &mut dyn Read) -> Result<Model> {
        let content = read_to_string(reader)?;
        let model: Model = toml::from_str(&content).map_err(ConfigError::TomlError)?;
        Ok(finalize(model))
    }

    fn properties(&self, reader: &mut dyn Read) -> Result<IndexMap<String, String>> {
        let content = read_to_string(reader)?;
        let value: toml::Value = toml::from_str(&content).map_err(ConfigError::TomlError)?;
        let json = serde_json::to_value(value).map_err(ConfigError::JsonError)?;

        let mut out = IndexMap::new();
        flatten_value("", &json, &mut out);
        Ok(out)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        toml::from_str::<toml::Value>(&content).map_err(ConfigError::TomlError)?;
        Ok(())
    }
}

/// YAML configuration parser
pub struct YamlParser;

impl ConfigParser for YamlParser {
    fn format(&self) -> &'static str {
        "yaml"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["yaml", "yml"])
    }

    fn parse(&self, reader: &mut dyn Read) -> Result<Model> {
        let content = read_to_string(reader)?;
        let model: Model = serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?;
        Ok(finalize(model))
    }

    fn properties(&self, reader: &mut dyn Read) -> Result<IndexMap<String, String>> {
        let content = read_to_string(reader)?;
        let json: serde_json::Value =
            serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?;

        let mut out = IndexMap::new();
        flatten_value("", &json, &mut out);
        Ok(out)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_yaml::from_str::<serde_yaml::Value>(&content).map_err(ConfigError::YamlError)?;
        Ok(())
    }
}

/// JSON configuration parser
pub struct JsonParser;

impl ConfigParser for JsonParser {
    fn format(&self) -> &'static str {
        "json"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn parse(&self, reader: &mut dyn Read) -> Result<Model> {
        let content = read_to_string(reader)?;
        let model: Model = serde_json::from_str(&content).map_err(ConfigError::JsonError)?;
        Ok(finalize(model))
    }

    fn properties(&self, reader: &mut dyn Read) -> Result<IndexMap<String, String>> {
        let content = read_to_string(reader)?;
        let json: serde_json::Value =
            serde_json::from_str(&content).map_err(ConfigError::JsonError)?;

        let mut out = IndexMap::new();
        flatten_value("", &json, &mut out);
        Ok(out)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str::<serde_json::Value>(&content).map_err(ConfigError::JsonError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_MODEL: &str = r#"
        [project]
        name = "demo"
        version = "1.0.0"
    "#;

    #[test]
    fn test_toml_parse() {
        let model = TomlParser.parse(&mut TOML_MODEL.as_bytes()).unwrap();
        assert_eq!(model.project.name, "demo");
    }

    #[test]
    fn test_yaml_parse() {
        let yaml = "project:\n  name: demo\n  version: 1.0.0\n";
        let model = YamlParser.parse(&mut yaml.as_bytes()).unwrap();
        assert_eq!(model.project.version, "1.0.0");
    }

    #[test]
    fn test_json_parse() {
        let json = r#"{"project": {"name": "demo", "version": "1.0.0"}}"#;
        let model = JsonParser.parse(&mut json.as_bytes()).unwrap();
        assert_eq!(model.project.name, "demo");
    }

    #[test]
    fn test_parse_sets_distribution_names() {
        let toml = r#"
            [project]
            name = "demo"
            version = "1.0.0"

            [distributions.app]
            artifacts = [{ path = "demo.tar.gz" }]
        "#;
        let model = TomlParser.parse(&mut toml.as_bytes()).unwrap();
        assert_eq!(model.distributions["app"].name, "app");
    }

    #[test]
    fn test_properties_flatten() {
        let props = TomlParser.properties(&mut TOML_MODEL.as_bytes()).unwrap();
        assert_eq!(props.get("project.name"), Some(&"demo".to_string()));
        assert_eq!(props.get("project.version"), Some(&"1.0.0".to_string()));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let mut bad = "not = [valid".as_bytes();
        assert!(TomlParser.parse(&mut bad).is_err());
    }
}
