use std::collections::BTreeMap;
use std::hash::Hasher;
use std::sync::Arc;
use std::thread;

use fantasylife_logic::{
    Catalog, GameData, ItemCounts, LicenseScheme, Options, PlayerId, build_catalog,
};
use twox_hash::XxHash64;

fn rendered(catalog: &Catalog) -> String {
    let table: BTreeMap<String, String> = catalog
        .iter()
        .map(|(key, predicate)| (key.to_string(), predicate.to_string()))
        .collect();
    serde_json::to_string_pretty(&table).unwrap()
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

fn catalog_for(options: Options, seed: u64) -> Catalog {
    build_catalog(
        &options.into_snapshot(seed).unwrap(),
        &GameData::bundled().unwrap(),
    )
    .unwrap()
}

#[test]
fn catalog_rendering_is_reproducible() {
    for &scheme in LicenseScheme::ALL {
        let options = Options {
            progressive_licenses: scheme,
            ..Options::default()
        };
        let first = rendered(&catalog_for(options.clone(), 1));
        let second = rendered(&catalog_for(options, 0xDEAD_BEEF));
        assert_eq!(
            snapshot_hash(first.as_bytes()),
            snapshot_hash(second.as_bytes()),
            "{scheme} catalog changed between builds\n{first}"
        );
    }
}

#[test]
fn catalog_json_exposes_rule_shapes() {
    let catalog = catalog_for(Options::default(), 1);
    let rule = catalog.resolve("license:Angler:Hero").unwrap();
    let value = serde_json::to_value(rule).unwrap();
    assert_eq!(value["kind"], "all_of");
    assert_eq!(value["terms"][0]["item"], "Chapter Complete");
    assert_eq!(value["terms"][1]["count"], 6);
}

#[test]
fn catalog_sizes_follow_dlc() {
    let base = catalog_for(
        Options {
            dlc: false,
            ..Options::default()
        },
        1,
    );
    let dlc = catalog_for(Options::default(), 1);
    assert!(dlc.len() > base.len());
    assert!(base.keys().all(|key| !key.to_string().contains("Creator")));
}

#[test]
fn catalog_serves_concurrent_probes() {
    let catalog = Arc::new(catalog_for(Options::default(), 1));
    let handles: Vec<_> = (0..4u32)
        .map(|worker| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                let state = ItemCounts::new(PlayerId(worker)).with("Lost Wish", worker * 10);
                catalog.goal_predicate().evaluate(&state)
            })
        })
        .collect();
    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![false, false, false, true]);
}
