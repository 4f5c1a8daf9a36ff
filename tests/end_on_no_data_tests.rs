//! `end_on_no_data`: tasks retire one by one and the attack ends by itself.

mod common;

use std::time::Duration;

use bfd_high_volume::attack;
use bfd_high_volume::config::SuiteConfig;
use bfd_high_volume::fixtures::{ContractRecord, Fixtures};
use common::fhir_stub;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_list_only_stops_its_own_tasks() {
    let (host, seen) = fhir_stub::spawn();
    let config = SuiteConfig {
        host: Some(host),
        users: 1,
        hatch_rate: 1.0,
        run_time: None,
        end_on_no_data: true,
        fixture_file: Some("unused.json".into()),
        tags: "patient".into(),
        exclude_tags: "v1".into(),
        ..SuiteConfig::default()
    };
    // no hashed MBIs at all: the hashed MBI search finishes on its first try
    let selected = attack::select_tasks(&config.tag_filter()).unwrap();
    let fixtures = Fixtures::new(
        vec!["-1".into(), "-2".into()],
        vec![ContractRecord {
            id: "Z0012".into(),
            year: "2021".into(),
        }],
        Vec::new(),
    );

    tokio::time::timeout(Duration::from_secs(60), attack::run(&config, &selected, fixtures))
        .await
        .expect("attack should end once every task is out of data")
        .unwrap();

    let seen = seen.lock().unwrap();
    let paths: Vec<&str> = seen.iter().map(|(path, _)| path.as_str()).collect();
    assert!(
        !paths.iter().any(|p| p.contains("mbi-hash")),
        "no hashed MBI searches expected: {paths:?}"
    );
    assert_eq!(
        paths.iter().filter(|p| p.contains("_id=")).count(),
        2,
        "both bene ids should be used: {paths:?}"
    );
    assert!(paths.contains(&"/v2/fhir/Patient?page=2"), "{paths:?}");
}
