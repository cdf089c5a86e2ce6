use fantasylife_logic::{Catalog, ItemCounts, Trace, TraceEntry};
use regex::Regex;
use serde::Serialize;

/// Outcome of evaluating one rule key against a state.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub key: String,
    pub rule: Option<String>,
    pub passed: Option<bool>,
    pub error: Option<String>,
    pub trace: Vec<TraceEntry>,
}

impl ProbeResult {
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub fn probe_keys(catalog: &Catalog, state: &ItemCounts, keys: &[String]) -> Vec<ProbeResult> {
    keys.iter()
        .map(|key| match catalog.resolve(key) {
            Ok(predicate) => {
                let mut trace = Trace::new();
                let passed = predicate.evaluate_traced(state, &mut trace);
                log::debug!("{key}: {passed} after {} probes", trace.len());
                ProbeResult {
                    key: key.clone(),
                    rule: Some(predicate.to_string()),
                    passed: Some(passed),
                    error: None,
                    trace: trace.entries().to_vec(),
                }
            }
            Err(err) => ProbeResult {
                key: key.clone(),
                rule: None,
                passed: None,
                error: Some(err.to_string()),
                trace: Vec::new(),
            },
        })
        .collect()
}

/// Catalog keys in stable order, optionally filtered by a regex.
pub fn list_keys(catalog: &Catalog, filter: Option<&Regex>) -> Vec<String> {
    catalog
        .keys()
        .map(ToString::to_string)
        .filter(|key| filter.is_none_or(|re| re.is_match(key)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantasylife_logic::{GameData, Options, PlayerId, build_catalog};

    fn catalog() -> Catalog {
        build_catalog(
            &Options::default().into_snapshot(1).unwrap(),
            &GameData::bundled().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn probes_report_results_and_unknown_keys() {
        let state = ItemCounts::new(PlayerId(1)).with("Lost Wish", 30);
        let keys = vec!["goal".to_string(), "bogus".to_string()];
        let results = probe_keys(&catalog(), &state, &keys);
        assert_eq!(results[0].passed, Some(true));
        assert_eq!(results[0].trace.len(), 1);
        assert!(!results[0].is_error());
        assert!(results[1].is_error());
        assert!(results[1].passed.is_none());
    }

    #[test]
    fn key_listing_honours_filter() {
        let filter = Regex::new(r"^chapter:").unwrap();
        let keys = list_keys(&catalog(), Some(&filter));
        assert_eq!(keys.len(), 9);
        assert!(keys.iter().all(|key| key.starts_with("chapter:")));
        assert!(list_keys(&catalog(), None).len() > keys.len());
    }
}
