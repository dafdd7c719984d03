use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Rule catalog supplied by the orchestration framework.
///
/// Read-only to evidra. Order is significant: observations are emitted in catalog order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Catalog {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub checks: Vec<Check>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Parameter {
    pub id: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Smallest unit of evaluation. `id` joins the catalog, the generated policy files, and reports.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Check {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Catalog {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// All (rule, check) pairs in catalog order.
    pub fn rule_checks(&self) -> impl Iterator<Item = (&Rule, &Check)> {
        self.rules
            .iter()
            .flat_map(|rule| rule.checks.iter().map(move |check| (rule, check)))
    }
}

impl Rule {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_parameter<K: Into<String>, V: Into<String>>(mut self, id: K, value: V) -> Self {
        self.parameters.push(Parameter {
            id: id.into(),
            value: value.into(),
            description: None,
        });
        self
    }

    pub fn with_check<S: Into<String>>(mut self, id: S) -> Self {
        self.checks.push(Check {
            id: id.into(),
            description: None,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_checks_follow_catalog_order() {
        let catalog = Catalog::new(vec![
            Rule::new("r1").with_check("a").with_check("b"),
            Rule::new("r2").with_check("c"),
        ]);

        let pairs: Vec<(&str, &str)> = catalog
            .rule_checks()
            .map(|(r, c)| (r.id.as_str(), c.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("r1", "a"), ("r1", "b"), ("r2", "c")]);
    }

    #[test]
    fn catalog_parses_with_missing_optional_lists() {
        let catalog: Catalog = serde_json::from_str(
            r#"{"rules":[{"id":"r1","checks":[{"id":"a"}]},{"id":"r2"}]}"#,
        )
        .expect("parse catalog");
        assert_eq!(catalog.rules.len(), 2);
        assert!(catalog.rules[0].parameters.is_empty());
        assert!(catalog.rules[1].checks.is_empty());
    }
}
