//! Coverage searches by beneficiary.

use super::{TaskDef, TaskNode};
use crate::error::FixtureError;
use crate::request::RequestSpec;
use crate::user::UserData;

const V1_PATH: &str = "/v1/fhir/Coverage";
const V2_PATH: &str = "/v2/fhir/Coverage";

pub const COVERAGE_TASKS: &[TaskNode] = &[
    TaskNode::Task(TaskDef {
        name: "coverage_test_id_count_v1",
        request_name: "/v1/fhir/Coverage search by id / count=10",
        summary: "Coverage search by ID, paginated",
        tags: &["coverage_test_id_count_v1", "v1"],
        template: id_count_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "coverage_test_id_last_updated_v1",
        request_name: "/v1/fhir/Coverage search by id / lastUpdated (2 weeks)",
        summary: "Coverage search by ID, Last Updated",
        tags: &["coverage_test_id_last_updated_v1", "v1"],
        template: id_last_updated_v1,
    }),
    TaskNode::Task(TaskDef {
        name: "coverage_test_id",
        request_name: "/v2/fhir/Coverage search by id",
        summary: "Coverage search by ID",
        tags: &["coverage_test_id", "v2"],
        template: id_v2,
    }),
    TaskNode::Task(TaskDef {
        name: "coverage_test_id_count",
        request_name: "/v2/fhir/Coverage search by id / count=10",
        summary: "Coverage search by ID, paginated",
        tags: &["coverage_test_id_count", "v2"],
        template: id_count_v2,
    }),
    TaskNode::Task(TaskDef {
        name: "coverage_test_id_last_updated",
        request_name: "/v2/fhir/Coverage search by id / lastUpdated (2 weeks)",
        summary: "Coverage search by ID, Last Updated",
        tags: &["coverage_test_id_last_updated", "v2"],
        template: id_last_updated_v2,
    }),
];

fn by_beneficiary_count(path: &str, data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(path)
        .param("beneficiary", data.bene_ids.pop()?)
        .param("_count", "10"))
}

fn by_beneficiary_last_updated(
    path: &str,
    data: &mut UserData,
) -> Result<RequestSpec, FixtureError> {
    let last_updated = data.last_updated_param();
    Ok(RequestSpec::get(path)
        .param("_lastUpdated", last_updated)
        .param("beneficiary", data.bene_ids.pop()?))
}

fn id_count_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_beneficiary_count(V1_PATH, data)
}

fn id_last_updated_v1(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_beneficiary_last_updated(V1_PATH, data)
}

fn id_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    Ok(RequestSpec::get(V2_PATH).param("beneficiary", data.bene_ids.pop()?))
}

fn id_count_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_beneficiary_count(V2_PATH, data)
}

fn id_last_updated_v2(data: &mut UserData) -> Result<RequestSpec, FixtureError> {
    by_beneficiary_last_updated(V2_PATH, data)
}
