//! Compile-time registry of regulation revisions.
//!
//! Each entry is a `(id, toml_content)` pair embedded via `include_str!`.
//! Adding a revision requires creating a TOML file in `regulations/` and
//! adding a corresponding entry here.

use crate::regulation::RegulationTables;

/// Number of registered regulation revisions. Enforced by a test.
#[cfg(test)]
const EXPECTED_REGULATION_COUNT: usize = 1;

/// Identifier of the revision used when none is requested.
pub const DEFAULT_REGULATION_ID: &str = "cra_720_2015";

/// Embedded TOML regulation tables.
const REGULATION_TOMLS: &[(&str, &str)] = &[(
    "cra_720_2015",
    include_str!("../regulations/cra_720_2015.toml"),
)];

fn parse(id: &str, toml_str: &str) -> RegulationTables {
    toml::de::from_str(toml_str)
        .unwrap_or_else(|e| panic!("Failed to parse regulation tables '{id}': {e}"))
}

/// Returns all registered regulation revisions.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. These are
/// compile-time constants, so a parse failure is a development error
/// caught by the tests below.
#[must_use]
pub fn all_regulations() -> Vec<RegulationTables> {
    REGULATION_TOMLS
        .iter()
        .map(|(id, toml_str)| parse(id, toml_str))
        .collect()
}

/// Looks up a regulation revision by its ID.
///
/// # Panics
///
/// Panics if the matching embedded TOML file fails to parse.
#[must_use]
pub fn regulation(id: &str) -> Option<RegulationTables> {
    REGULATION_TOMLS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(key, toml_str)| parse(key, toml_str))
}

/// Returns the tables of [`DEFAULT_REGULATION_ID`].
///
/// # Panics
///
/// Panics if the default revision is not registered or fails to parse.
#[must_use]
pub fn default_regulation() -> RegulationTables {
    regulation(DEFAULT_REGULATION_ID)
        .unwrap_or_else(|| panic!("Default regulation '{DEFAULT_REGULATION_ID}' is not registered"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use waste_tariff_models::{SubscriberClass, operations::LeachateScenario};

    #[test]
    fn loads_all_regulations() {
        let regulations = all_regulations();
        assert_eq!(
            regulations.len(),
            EXPECTED_REGULATION_COUNT,
            "Expected {EXPECTED_REGULATION_COUNT} regulations, found {}. \
             Update EXPECTED_REGULATION_COUNT after adding/removing revisions.",
            regulations.len()
        );
    }

    #[test]
    fn registry_keys_match_table_ids() {
        let mut seen = BTreeSet::new();
        for (key, toml_str) in REGULATION_TOMLS {
            let tables = parse(key, toml_str);
            assert_eq!(*key, tables.id, "Registry key does not match table id");
            assert!(seen.insert(tables.id.clone()), "Duplicate regulation ID: {key}");
        }
    }

    #[test]
    fn default_regulation_has_every_scenario() {
        let tables = default_regulation();
        for scenario in [1, 2, 3, 4] {
            let scenario = LeachateScenario::from_value(scenario).unwrap();
            assert!(
                tables.leachate.scenario(scenario).is_some(),
                "Missing leachate scenario {}",
                scenario.value()
            );
        }
        assert!(tables.leachate.scenario(LeachateScenario::Recirculation).is_none());
        assert!(
            (tables.leachate.public_discount(LeachateScenario::Recirculation) - 0.80).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn default_regulation_weights_and_schedule() {
        let tables = default_regulation();
        assert!((tables.production_weights.commercial - 2.44).abs() < f64::EPSILON);
        assert!(
            (tables.subsidy_schedule.factor(SubscriberClass::Stratum1) + 0.70).abs()
                < f64::EPSILON
        );
        assert!(tables.subsidy_schedule.out_of_range().is_empty());
    }

    #[test]
    fn formula_catalogue_covers_every_component() {
        let tables = default_regulation();
        for component in [
            "CFT", "CCS", "CLUS", "CBLS", "CVNA", "CRT", "CDF", "CTL", "VBA", "TRNA", "TFS",
        ] {
            let formula = tables
                .formula(component)
                .unwrap_or_else(|| panic!("Missing formula for {component}"));
            assert!(!formula.formula.is_empty());
            assert!(formula.reference.starts_with("Art. "));
        }
    }

    #[test]
    fn unknown_regulation_is_none() {
        assert!(regulation("cra_000_1999").is_none());
    }
}
