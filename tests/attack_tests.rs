//! End-to-end run of the goose attack against a local stub FHIR server.

mod common;

use bfd_high_volume::attack;
use bfd_high_volume::config::SuiteConfig;
use bfd_high_volume::fixtures::{ContractRecord, Fixtures};
use common::fhir_stub;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_attack_follows_pages_with_headers() {
    let (host, seen) = fhir_stub::spawn();
    let config = SuiteConfig {
        host: Some(host),
        users: 1,
        hatch_rate: 1.0,
        run_time: Some(2),
        fixture_file: Some("unused.json".into()),
        tags: "patient_test_coverage_contract".into(),
        ..SuiteConfig::default()
    };
    let selected = attack::select_tasks(&config.tag_filter()).unwrap();
    let fixtures = Fixtures::new(
        vec!["-1".into()],
        vec![ContractRecord {
            id: "Z0012".into(),
            year: "2021".into(),
        }],
        Vec::new(),
    );

    attack::run(&config, &selected, fixtures).await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.len() >= 2, "expected a search and its next page, got {seen:?}");
    assert!(seen[0].0.starts_with("/v2/fhir/Patient?_has%3ACoverage.extension="));
    assert_eq!(seen[1].0, "/v2/fhir/Patient?page=2");
    assert!(seen
        .iter()
        .all(|(_, header)| header.as_deref() == Some("mbi")));
}
