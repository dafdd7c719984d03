//! Property-based tests for the domain crate.
//!
//! Invariants covered:
//! - decision precedence (error > violations > pass > default-deny)
//! - input classification and report status
//! - observation mapping only reports checks with evidence

use crate::activity::{report_status, report_to_activity};
use crate::normalize::normalize;
use crate::observe::{classify_input, map_observations};
use crate::test_support::{MapLookup, input, report, ts};
use evidra_types::{ActivityKind, Catalog, Outcome, Rule, RuleResult};
use proptest::prelude::*;
use serde_json::{Map, Value as JsonValue, json};

// ============================================================================
// Strategies
// ============================================================================

fn arb_check_id() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").unwrap()
}

/// Decision payloads with each known field independently present or absent.
fn arb_payload() -> impl Strategy<Value = JsonValue> {
    (
        prop::option::of(any::<bool>()),
        prop::option::of("[a-z ]{0,12}"),
        prop::collection::vec(arb_check_id(), 0..4),
    )
        .prop_map(|(pass, error, violations)| {
            let mut obj = Map::new();
            if let Some(pass) = pass {
                obj.insert("pass".to_string(), json!(pass));
            }
            if let Some(error) = error {
                obj.insert("error".to_string(), json!(error));
            }
            let violation: Map<String, JsonValue> =
                violations.into_iter().map(|v| (v, json!(true))).collect();
            obj.insert("violation".to_string(), JsonValue::Object(violation));
            JsonValue::Object(obj)
        })
}

fn arb_input() -> impl Strategy<Value = evidra_types::Input> {
    (
        "[a-z]{1,8}\\.yaml",
        any::<bool>(),
        prop::collection::vec("[a-z ]{1,10}", 0..3),
        prop::collection::vec("[a-z ]{1,10}", 0..3),
    )
        .prop_map(|(path, success, violations, successes)| {
            let mut i = input(&path, success);
            i.violations = violations.into_iter().map(RuleResult::new).collect();
            i.successes = successes.into_iter().map(RuleResult::new).collect();
            i
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn normalize_follows_precedence(payload in arb_payload()) {
        let r = normalize(&payload);
        let has_error = payload["error"].as_str().is_some_and(|s| !s.is_empty());
        let has_violations = payload["violation"].as_object().is_some_and(|m| !m.is_empty());
        let pass = payload["pass"].as_bool() == Some(true);

        let expected = if has_error {
            Outcome::Error
        } else if has_violations {
            Outcome::Fail
        } else if pass {
            Outcome::Pass
        } else {
            Outcome::Fail
        };
        prop_assert_eq!(r.outcome, expected);
        prop_assert_eq!(r.passed, expected == Outcome::Pass);
    }

    #[test]
    fn arbitrary_json_never_panics(text in "\\PC{0,40}") {
        let value = serde_json::from_str::<JsonValue>(&text).unwrap_or(JsonValue::String(text));
        let _ = normalize(&value);
    }

    #[test]
    fn classification_matches_definition(i in arb_input()) {
        let outcome = classify_input(&i);
        if i.success && i.violations.is_empty() {
            prop_assert_eq!(outcome, Outcome::Pass);
        } else {
            prop_assert_eq!(outcome, Outcome::Fail);
        }
    }

    #[test]
    fn status_mirrors_report_success(success in any::<bool>(), kind in prop_oneof![Just(ActivityKind::Api), Just(ActivityKind::Scan)]) {
        let r = report("p", success, vec![input("a.yaml", success)], &[]);
        let (status, id) = report_status(&r);
        prop_assert_eq!(status == "success", success);
        prop_assert_eq!(id, if success { 1 } else { 2 });

        let activity = report_to_activity(&r, kind);
        prop_assert_eq!(activity.kind(), kind);
        prop_assert_eq!(activity.base().status_id, id);
    }

    #[test]
    fn observations_only_for_checks_with_reports(
        indexed in prop::collection::btree_set(arb_check_id(), 0..5),
        catalog_checks in prop::collection::vec(arb_check_id(), 0..8),
    ) {
        let indexed: Vec<&str> = indexed.iter().map(String::as_str).collect();
        let lookup = MapLookup::from_reports(vec![report("p", true, vec![input("a.yaml", true)], &indexed)]);

        let rule = catalog_checks.iter().fold(Rule::new("r"), |r, c| r.with_check(c.clone()));
        let obs = map_observations(&Catalog::new(vec![rule]), &lookup, ts(0));

        let expected: Vec<&String> = catalog_checks.iter().filter(|c| indexed.contains(&c.as_str())).collect();
        let got: Vec<&String> = obs.iter().map(|o| &o.check_id).collect();
        prop_assert_eq!(got, expected);
        for o in &obs {
            prop_assert_eq!(o.subjects.len(), 1);
        }
    }
}
