//! Patient searches: by contract, by hashed MBI and by ID.
//!
//! The contract and hashed MBI searches return paged `Bundle`s; the user walks
//! the `next` links on later iterations before popping new fixture data.

use super::{TaskDef, TaskNode};
use crate::error::FixtureError;
use crate::request::RequestSpec;
use crate::user::UserData;

const CONTRACT_SYSTEM: &str = "https://bluebutton.cms.gov/resources/variables/ptdcntrct01";
const REFERENCE_YEAR_SYSTEM: &str = "https://bluebutton.cms.gov/resources/variables/rfrnc_yr";
const MBI_HASH_SYSTEM: &str = "https://bluebutton.cms.gov/resources/identifier/mbi-hash";

pub const PATIENT_TASKS: &[TaskNode] = &[
    TaskNode::Task(TaskDef {
        name: "patient_test_coverage_contract_v1",
        request_name: "/v1/fhir/Patient search by coverage contract (all pages)",
        summary: "Patient search by coverage contract (all pages)",
        tags: &["patient_test_coverage_contract_v1", "v1"],
        template: coverage_contract_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "patient_test_hashed_mbi_v1",
        request_name: "/v1/fhir/Patient search by hashed mbi / includeIdentifiers = mbi",
        summary: "Patient search by hashed MBI, include identifiers",
        tags: &["patient_test_hashed_mbi_v1", "v1"],
        template: hashed_mbi_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "patient_test_id_last_updated_include_mbi_include_address_v1",
        request_name: "/v1/fhir/Patient/id search by id / (2 weeks) / includeTaxNumbers / mbi",
        summary: "Patient search by ID, Last Updated, include MBI, include Address",
        tags: &["patient_test_id_last_updated_include_mbi_include_address_v1", "v1"],
        template: id_last_updated_include_mbi_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "patient_test_id_v1",
        request_name: "/v1/fhir/Patient/id",
        summary: "Patient read by ID",
        tags: &["patient_test_id_v1", "v1"],
        template: id_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "patient_test_coverage_contract",
        request_name: "/v2/fhir/Patient search by coverage contract (all pages)",
        summary: "Patient search by coverage contract, paginated",
        tags: &["patient_test_coverage_contract", "v2"],
        template: coverage_contract_v2,
    }),
    TaskNode::Task(TaskDef {
        name: "patient_test_hashed_mbi",
        request_name: "/v2/fhir/Patient search by hashed mbi / includeIdentifiers = mbi",
        summary: "Patient search by hashed MBI, include identifiers",
        tags: &["patient_test_hashed_mbi", "v2"],
        template: hashed_mbi_v2,
    }),
    TaskNode::Task(TaskDef {
        name: "patient_test_id_include_mbi_last_updated",
        request_name: "/v2/fhir/Patient search by id / _IncludeIdentifiers=mbi / (2 weeks)",
        summary: "Patient search by ID with last updated, include MBI",
        tags: &["patient_test_id_include_mbi_last_updated", "v2"],
        template: id_include_mbi_last_updated_v2,
    }),
    TaskNode::Task(TaskDef {
        name: "patient_test_id",
        request_name: "/v2/fhir/Patient search by id",
        summary: "Patient search by ID",
        tags: &["patient_test_id", "v2"],
        template: id_v2,
    }),
];

fn by_contract(path: &str, data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    let contract = data.contract_data.pop()?;
    Ok(RequestSpec::get(path)
        .param(
            "_has:Coverage.extension",
            format!("{CONTRACT_SYSTEM}|{}", contract.id),
        )
        .param(
            "_has:Coverage.rfrncyr",
            format!("{REFERENCE_YEAR_SYSTEM}|{}", contract.year),
        )
        .param("_count", "25")
        .param("_format", "json")
        .header("IncludeIdentifiers", "mbi")
        .follow_pages())
}

fn by_hashed_mbi(path: &str, data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    let hash = data.hashed_mbis.pop()?;
    Ok(RequestSpec::get(path)
        .param("identifier", format!("{MBI_HASH_SYSTEM}|{hash}"))
        .param("_IncludeIdentifiers", "mbi")
        .follow_pages())
}

fn coverage_contract_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_contract("/v1/fhir/Patient", data)
}

fn coverage_contract_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_contract("/v2/fhir/Patient", data)
}

fn hashed_mbi_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_hashed_mbi("/v1/fhir/Patient/", data)
}

fn hashed_mbi_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_hashed_mbi("/v2/fhir/Patient/", data)
}

fn id_last_updated_include_mbi_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get("/v1/fhir/Patient")
        .param("_id", data.bene_ids.pop()?)
        .param("_lastUpdated", data.last_updated_param())
        .param("_IncludeIdentifiers", "mbi")
        .param("_IncludeTaxNumbers", "true"))
}

fn id_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    let bene_id = data.bene_ids.pop()?;
    Ok(RequestSpec::get(format!("/v1/fhir/Patient/{bene_id}")).follow_pages())
}

fn id_include_mbi_last_updated_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get("/v2/fhir/Patient")
        .param("_id", data.bene_ids.pop()?)
        .param("_format", "application/fhir+json")
        .param("_IncludeIdentifiers", "mbi")
        .param("_lastUpdated", data.last_updated_param()))
}

fn id_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get("/v2/fhir/Patient")
        .param("_id", data.bene_ids.pop()?)
        .param("_format", "application/fhir+json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ContractRecord, Fixtures};
    use crate::user::UserSettings;

    fn user() -> UserData {
        let fixtures = Fixtures::new(
            vec!["-5".into()],
            vec![ContractRecord {
                id: "Z0012".into(),
                year: "2021".into(),
            }],
            vec!["abc123".into()],
        );
        UserData::new(&fixtures, &UserSettings::default())
    }

    #[test]
    fn test_coverage_contract() {
        let mut data = user();
        let spec = coverage_contract_v2(&mut data).unwrap();
        assert_eq!(
            spec.url(),
            "/v2/fhir/Patient?_has%3ACoverage.extension=https%3A%2F%2Fbluebutton.cms.gov%2Fresources%2Fvariables%2Fptdcntrct01%7CZ0012&_has%3ACoverage.rfrncyr=https%3A%2F%2Fbluebutton.cms.gov%2Fresources%2Fvariables%2Frfrnc_yr%7C2021&_count=25&_format=json"
        );
        assert_eq!(spec.headers, vec![("IncludeIdentifiers", "mbi")]);
        assert!(spec.follow_pages);
        assert_eq!(data.contract_data.remaining(), 0);
        assert_eq!(data.bene_ids.remaining(), 1);
    }

    #[test]
    fn test_hashed_mbi_keeps_trailing_slash() {
        let mut data = user();
        let spec = hashed_mbi_v1(&mut data).unwrap();
        assert_eq!(
            spec.url(),
            "/v1/fhir/Patient/?identifier=https%3A%2F%2Fbluebutton.cms.gov%2Fresources%2Fidentifier%2Fmbi-hash%7Cabc123&_IncludeIdentifiers=mbi"
        );
        assert!(spec.follow_pages);
        assert_eq!(data.hashed_mbis.remaining(), 0);
    }

    #[test]
    fn test_id_v1_is_a_read() {
        let spec = id_v1(&mut user()).unwrap();
        assert_eq!(spec.url(), "/v1/fhir/Patient/-5");
        assert!(spec.params.is_empty());
    }

    #[test]
    fn test_id_include_mbi_last_updated_v2() {
        let spec = id_include_mbi_last_updated_v2(&mut user()).unwrap();
        assert_eq!(
            spec.url(),
            "/v2/fhir/Patient?_id=-5&_format=application%2Ffhir%2Bjson&_IncludeIdentifiers=mbi&_lastUpdated=gt2022-06-29"
        );
    }

    #[test]
    fn test_missing_contracts_is_reported_by_kind() {
        let fixtures = Fixtures::new(vec!["-5".into()], Vec::new(), Vec::new());
        let mut data = UserData::new(&fixtures, &UserSettings::default());
        let err = coverage_contract_v1(&mut data).unwrap_err();
        assert!(err.to_string().contains("contract_data"));
        assert_eq!(data.bene_ids.remaining(), 1);
    }
}
