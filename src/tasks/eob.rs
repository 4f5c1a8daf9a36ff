//! ExplanationOfBenefit searches by beneficiary.

use super::{TaskDef, TaskNode};
use crate::error::FixtureError;
use crate::request::RequestSpec;
use crate::user::UserData;

const V1_PATH: &str = "/v1/fhir/ExplanationOfBenefit";
const V2_PATH: &str = "/v2/fhir/ExplanationOfBenefit";

pub const EOB_TASKS: &[TaskNode] = &[
    TaskNode::Task(TaskDef {
        name: "eob_test_id_count_type_pde_v1",
        request_name: "/v1/fhir/ExplanationOfBenefit search by id / type = PDE / count = 50",
        summary: "Explanation of Benefit search by ID, type PDE, paginated",
        tags: &["eob_test_id_count_type_pde_v1", "v1"],
        template: id_count_type_pde_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "eob_test_id_last_updated_count_v1",
        request_name: "/v1/fhir/ExplanationOfBenefit search by id / lastUpdated / count = 100",
        summary: "Explanation of Benefit search by ID, Last Updated, paginated",
        tags: &["eob_test_id_last_updated_count_v1", "v1"],
        template: id_last_updated_count_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "eob_test_id_include_tax_number_last_updated_v1",
        request_name: "/v1/fhir/ExplanationOfBenefit search by id / lastUpdated / includeTaxNumbers",
        summary: "Explanation of Benefit search by ID, Last Updated, Include Tax Numbers",
        tags: &["eob_test_id_include_tax_number_last_updated_v1", "v1"],
        template: id_include_tax_number_last_updated_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "eob_test_id_last_updated_v1",
        request_name: "/v1/fhir/ExplanationOfBenefit search by id / lastUpdated",
        summary: "Explanation of Benefit search by ID, Last Updated",
        tags: &["eob_test_id_last_updated_v1", "v1"],
        template: id_last_updated_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "eob_test_id_v1",
        request_name: "/v1/fhir/ExplanationOfBenefit search by id",
        summary: "Explanation of Benefit search by ID",
        tags: &["eob_test_id_v1", "v1"],
        template: id_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "eob_test_id",
        request_name: "/v2/fhir/ExplanationOfBenefit search by id",
        summary: "Explanation of Benefit search by ID",
        tags: &["eob_test_id", "v2"],
        template: id_v2,
    }),
    TaskNode::Task(TaskDef {
        name: "eob_test_id_count",
        request_name: "/v2/fhir/ExplanationOfBenefit search by id / count=10",
        summary: "Explanation of Benefit search by ID, paginated",
        tags: &["eob_test_id_count", "v2"],
        template: id_count_v2,
    }),
    TaskNode::Task(TaskDef {
        name: "eob_test_id_include_tax_number_last_updated",
        request_name: "/v2/fhir/ExplanationOfBenefit search by id / lastUpdated / includeTaxNumbers",
        summary: "Explanation of Benefit search by ID, Last Updated, Include Tax Numbers",
        tags: &["eob_test_id_include_tax_number_last_updated", "v2"],
        template: id_include_tax_number_last_updated_v2,
    }),
];

fn id_count_type_pde_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V1_PATH)
        .param("patient", data.bene_ids.pop()?)
        .param("_format", "json")
        .param("_count", "50")
        .param("_types", "PDE"))
}

fn id_last_updated_count_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V1_PATH)
        .param("patient", data.bene_ids.pop()?)
        .param("_format", "json")
        .param("_count", "100")
        .param("_lastUpdated", data.last_updated_param()))
}

fn id_include_tax_number_last_updated_v1(
    data: &mut UserData,
) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V1_PATH)
        .param("patient", data.bene_ids.pop()?)
        .param("_format", "json")
        .param("_lastUpdated", data.last_updated_param())
        .param("_IncludeTaxNumbers", "true"))
}

fn id_last_updated_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V1_PATH)
        .param("patient", data.bene_ids.pop()?)
        .param("_format", "json")
        .param("_lastUpdated", data.last_updated_param()))
}

fn id_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V1_PATH)
        .param("patient", data.bene_ids.pop()?)
        .param("_format", "application/fhir+json"))
}

fn id_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V2_PATH)
        .param("patient", data.bene_ids.pop()?)
        .param("_format", "application/fhir+json"))
}

fn id_count_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V2_PATH)
        .param("patient", data.bene_ids.pop()?)
        .param("_count", "10")
        .param("_format", "application/fhir+json"))
}

fn id_include_tax_number_last_updated_v2(
    data: &mut UserData,
) -> Result<RequestSpec, FixtureError> {
    let last_updated = data.last_updated_param();
    Ok(RequestSpec::get(V2_PATH)
        .param("_lastUpdated", last_updated)
        .param("patient", data.bene_ids.pop()?)
        .param("_IncludeTaxNumbers", "true")
        .param("_format", "application/fhir+json"))
}
