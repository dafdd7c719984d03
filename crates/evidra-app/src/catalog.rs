use anyhow::Context;
use camino::Utf8Path;
use evidra_types::Catalog;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Yaml,
}

impl CatalogFormat {
    /// `.json` is JSON; anything else is read as YAML.
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => CatalogFormat::Json,
            _ => CatalogFormat::Yaml,
        }
    }
}

pub fn parse_catalog(text: &str, format: CatalogFormat) -> anyhow::Result<Catalog> {
    let catalog = match format {
        CatalogFormat::Json => serde_json::from_str(text).context("parse catalog json")?,
        CatalogFormat::Yaml => serde_yaml::from_str(text).context("parse catalog yaml")?,
    };
    Ok(catalog)
}

pub fn load_catalog(path: &Utf8Path) -> anyhow::Result<Catalog> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    let catalog = parse_catalog(&text, CatalogFormat::from_path(path))
        .with_context(|| format!("load catalog {path}"))?;
    tracing::debug!(path = %path, rules = catalog.rules.len(), "loaded catalog");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_and_json_catalogs_agree() {
        let yaml = r#"
rules:
  - id: r1
    parameters:
      - id: max_age
        value: "30"
    checks:
      - id: a
      - id: b
"#;
        let json = r#"{"rules":[{"id":"r1","parameters":[{"id":"max_age","value":"30"}],"checks":[{"id":"a"},{"id":"b"}]}]}"#;

        let from_yaml = parse_catalog(yaml, CatalogFormat::Yaml).expect("yaml");
        let from_json = parse_catalog(json, CatalogFormat::Json).expect("json");
        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.rules[0].checks.len(), 2);
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(CatalogFormat::from_path(Utf8Path::new("c.JSON")), CatalogFormat::Json);
        assert_eq!(CatalogFormat::from_path(Utf8Path::new("c.yml")), CatalogFormat::Yaml);
        assert_eq!(CatalogFormat::from_path(Utf8Path::new("catalog")), CatalogFormat::Yaml);
    }

    #[test]
    fn malformed_catalog_is_an_error() {
        assert!(parse_catalog("{", CatalogFormat::Json).is_err());
        assert!(parse_catalog("rules: [ { checks: 3 } ]", CatalogFormat::Yaml).is_err());
    }
}
