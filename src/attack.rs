//! # Attack
//!
//! Turns the filtered task catalogue into a goose load test.
//!
//! ## Layout
//!
//! Every retained top-level group becomes one goose `Scenario` named after the
//! group. A scenario holds:
//!
//! - an on-start transaction that gives the user its [`UserData`] (private
//!   shuffled fixture pools) and, when configured, a client carrying the
//!   TLS client certificate;
//! - one transaction per retained task, named after the task; its requests
//!   are recorded under the task's request name.
//!
//! ## Task iteration
//!
//! 1. A finished task sleeps for a second and does nothing else.
//! 2. A pending next-page URL for the task is requested as is; otherwise the
//!    task's template builds a fresh request.
//! 3. When the template runs out of fixture data the task is finished
//!    (`end_on_no_data`) or, if the master list itself is empty, backs off.
//!    Other tasks of the same user carry on with their own data.
//! 4. Paged tasks store the response Bundle's `next` link for the next
//!    iteration.
//!
//! Once every task of every user has finished the attack ends without
//! waiting for the run time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use goose::config::GooseConfiguration;
use goose::prelude::*;
use serde_json::Value;
use tokio::sync::Notify;

use crate::config::SuiteConfig;
use crate::error::FixtureError;
use crate::fixtures::Fixtures;
use crate::request::next_page_url;
use crate::tags::{filter_tasks, unknown_tags, FilteredNode, TagFilter};
use crate::tasks::{TaskDef, CATALOG};
use crate::user::{PendingPage, UserData, UserSettings};

/// How long a finished or starved task waits between no-op iterations.
const IDLE_BACKOFF: Duration = Duration::from_secs(1);

/// State shared by every transaction of every user.
struct AttackContext {
    fixtures: Fixtures,
    settings: UserSettings,
    completion: Completion,
}

/// Counts users whose tasks have all finished.
struct Completion {
    users: usize,
    done: AtomicUsize,
    all_done: Notify,
}

impl Completion {
    fn new(users: usize) -> Self {
        Self {
            users,
            done: AtomicUsize::new(0),
            all_done: Notify::new(),
        }
    }

    /// Record one more finished user. Returns `true` for the last one.
    fn user_finished(&self) -> bool {
        let last = self.done.fetch_add(1, Ordering::SeqCst) + 1 == self.users;
        if last {
            self.all_done.notify_one();
        }
        last
    }
}

/// Apply `filter` to the catalogue, warning about tags nothing carries.
///
/// # Errors
///
/// Fails when no task survives the filter.
pub fn select_tasks(filter: &TagFilter) -> anyhow::Result<Vec<FilteredNode<'static>>> {
    for tag in unknown_tags(filter, CATALOG) {
        tracing::warn!(%tag, "tag is not carried by any task");
    }
    let selected = filter_tasks(CATALOG, filter);
    if selected.is_empty() {
        return Err(anyhow!(
            "no tasks match tags [{}] excluding [{}]",
            join(&filter.include),
            join(&filter.exclude)
        ));
    }
    Ok(selected)
}

fn join(tags: &crate::tags::TagSet) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Run the load test over `selected` (see [`select_tasks`]) to completion.
pub async fn run(
    config: &SuiteConfig,
    selected: &[FilteredNode<'static>],
    fixtures: Fixtures,
) -> anyhow::Result<()> {
    config.validate()?;
    if selected.is_empty() {
        return Err(anyhow!("no tasks selected"));
    }
    let settings = config.user_settings()?;
    let ctx = Arc::new(AttackContext {
        fixtures,
        settings,
        completion: Completion::new(config.users),
    });

    let mut registered = GooseAttack::initialize_with_config(GooseConfiguration::default())
        .map_err(|e| anyhow!("{e}"))?;
    for node in selected {
        tracing::info!(
            scenario = node.name(),
            transactions = node.tasks().len(),
            "registering scenario"
        );
        registered = registered.register_scenario(build_scenario(node, &ctx));
    }

    let host = config.host.as_deref().unwrap_or_default();
    let hatch_rate = config.hatch_rate.to_string();
    let mut attack = registered
        .set_default(GooseDefault::Host, host)
        .and_then(|a| a.set_default(GooseDefault::Users, config.users))
        .and_then(|a| a.set_default(GooseDefault::HatchRate, hatch_rate.as_str()))
        .and_then(|a| a.set_default(GooseDefault::AcceptInvalidCerts, !config.verify_tls))
        .map_err(|e| anyhow!("{e}"))?;
    if let Some(secs) = config.run_time {
        let secs = usize::try_from(secs).context("run time out of range")?;
        attack = attack
            .set_default(GooseDefault::RunTime, secs)
            .map_err(|e| anyhow!("{e}"))?;
    }
    if let Some(report) = &config.report_file {
        let report = report
            .to_str()
            .ok_or_else(|| anyhow!("Invalid UTF-8 in report file path"))?;
        attack = attack
            .set_default(GooseDefault::ReportFile, report)
            .map_err(|e| anyhow!("{e}"))?;
    }

    tracing::info!(host, users = config.users, "starting load test");
    tokio::select! {
        result = attack.execute() => {
            let metrics = result.map_err(|e| anyhow!("{e}"))?;
            tracing::info!(duration_secs = metrics.duration, "load test finished");
        }
        () = ctx.completion.all_done.notified() => {
            tracing::info!(users = config.users, "every user ran out of fixture data; ending load test");
        }
    }
    Ok(())
}

fn build_scenario(node: &FilteredNode<'static>, ctx: &Arc<AttackContext>) -> Scenario {
    let mut scenario = Scenario::new(node.name())
        .register_transaction(Transaction::new(on_start(ctx)).set_name("on_start").set_on_start());
    let tasks = node.tasks();
    let task_count = tasks.len();
    for task in tasks {
        scenario = scenario.register_transaction(
            Transaction::new(task_transaction(task, task_count, ctx)).set_name(task.name),
        );
    }
    scenario
}

fn on_start(ctx: &Arc<AttackContext>) -> TransactionFunction {
    let ctx = Arc::clone(ctx);
    Arc::new(move |user| {
        let ctx = Arc::clone(&ctx);
        Box::pin(async move {
            user.set_session_data(UserData::new(&ctx.fixtures, &ctx.settings));
            if let Some(pem) = &ctx.settings.client_identity_pem {
                let identity = reqwest::Identity::from_pem(pem)
                    .map_err(|e| Box::new(TransactionError::Reqwest(e)))?;
                let builder = reqwest::Client::builder()
                    .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
                    .timeout(ctx.settings.request_timeout)
                    .danger_accept_invalid_certs(!ctx.settings.verify_tls)
                    .identity(identity);
                user.set_client_builder(builder).await?;
            }
            Ok(())
        })
    })
}

/// Where the next request of a task points, or why there is none.
#[derive(Debug, PartialEq)]
enum NextRequest {
    Send {
        url: String,
        headers: Vec<(&'static str, &'static str)>,
        follow_pages: bool,
    },
    Finished,
    NoData(FixtureError),
}

/// Decide the task's next request from the user's state.
fn next_request(task: &TaskDef, data: &mut UserData) -> NextRequest {
    if data.is_finished(task.name) {
        return NextRequest::Finished;
    }
    if let Some(page) = data.take_next_page(task.name) {
        return NextRequest::Send {
            url: page.url,
            headers: page.headers,
            follow_pages: true,
        };
    }
    match task.build_request(data) {
        Ok(spec) => NextRequest::Send {
            url: spec.url(),
            headers: spec.headers,
            follow_pages: spec.follow_pages,
        },
        Err(err) => NextRequest::NoData(err),
    }
}

/// `scenario_tasks` is the number of tasks sharing the user, so the user
/// can report itself finished once all of them are.
fn task_transaction(
    task: &'static TaskDef,
    scenario_tasks: usize,
    ctx: &Arc<AttackContext>,
) -> TransactionFunction {
    let ctx = Arc::clone(ctx);
    Arc::new(move |user| {
        let ctx = Arc::clone(&ctx);
        Box::pin(async move {
            let user_index = user.weighted_users_index;
            if user.get_session_data::<UserData>().is_none() {
                user.set_session_data(UserData::new(&ctx.fixtures, &ctx.settings));
            }
            let Some(data) = user.get_session_data_mut::<UserData>() else {
                return Ok(());
            };

            let (url, headers, follow_pages) = match next_request(task, data) {
                NextRequest::Send {
                    url,
                    headers,
                    follow_pages,
                } => (url, headers, follow_pages),
                NextRequest::Finished => {
                    tokio::time::sleep(IDLE_BACKOFF).await;
                    return Ok(());
                }
                NextRequest::NoData(err) if ctx.settings.end_on_no_data => {
                    tracing::warn!(task = task.name, user = user_index, %err, "out of fixture data; task finished");
                    if data.finish_task(task.name) && data.finished_tasks() == scenario_tasks {
                        tracing::info!(user = user_index, "all tasks finished");
                        ctx.completion.user_finished();
                    }
                    return Ok(());
                }
                NextRequest::NoData(err) => {
                    tracing::warn!(task = task.name, user = user_index, %err, "out of fixture data");
                    tokio::time::sleep(IDLE_BACKOFF).await;
                    return Ok(());
                }
            };

            let mut request_builder = user.get_request_builder(&GooseMethod::Get, &url)?;
            for (name, value) in &headers {
                request_builder = request_builder.header(*name, *value);
            }
            let goose_request = GooseRequest::builder()
                .set_request_builder(request_builder)
                .name(task.request_name)
                .build();
            let goose = user.request(goose_request).await?;

            if follow_pages {
                let next = match goose.response {
                    Ok(response) => response
                        .json::<Value>()
                        .await
                        .ok()
                        .and_then(|bundle| next_page_url(&bundle))
                        .map(|url| PendingPage { url, headers }),
                    Err(_) => None,
                };
                if let Some(data) = user.get_session_data_mut::<UserData>() {
                    data.set_next_page(task.name, next);
                }
            }
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ContractRecord, Fixtures};
    use crate::tasks::find_task;

    fn data(end_on_no_data: bool) -> UserData {
        let fixtures = Fixtures::new(
            vec!["-1".into()],
            vec![ContractRecord {
                id: "Z0012".into(),
                year: "2021".into(),
            }],
            Vec::new(),
        );
        let settings = UserSettings {
            end_on_no_data,
            ..UserSettings::default()
        };
        UserData::new(&fixtures, &settings)
    }

    #[test]
    fn test_select_tasks_rejects_empty_selection() {
        let err = select_tasks(&TagFilter::from_strs("v3", "")).unwrap_err();
        assert_eq!(err.to_string(), "no tasks match tags [v3] excluding []");
    }

    #[test]
    fn test_select_tasks_groups() {
        let selected = select_tasks(&TagFilter::from_strs("", "eob")).unwrap();
        let names: Vec<_> = selected.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["coverage", "patient"]);
    }

    #[test]
    fn test_next_request_from_template() {
        let task = find_task(CATALOG, "coverage_test_id").unwrap();
        let mut data = data(false);
        assert_eq!(
            next_request(task, &mut data),
            NextRequest::Send {
                url: "/v2/fhir/Coverage?beneficiary=-1".into(),
                headers: Vec::new(),
                follow_pages: false,
            }
        );
    }

    #[test]
    fn test_next_request_prefers_pending_page() {
        let task = find_task(CATALOG, "patient_test_coverage_contract").unwrap();
        let mut data = data(true);
        data.set_next_page(
            task.name,
            Some(PendingPage {
                url: "https://bfd/v2/fhir/Patient?page=2".into(),
                headers: vec![("IncludeIdentifiers", "mbi")],
            }),
        );

        match next_request(task, &mut data) {
            NextRequest::Send {
                url,
                headers,
                follow_pages,
            } => {
                assert_eq!(url, "https://bfd/v2/fhir/Patient?page=2");
                assert_eq!(headers, vec![("IncludeIdentifiers", "mbi")]);
                assert!(follow_pages);
            }
            other => panic!("unexpected {other:?}"),
        }
        // the contract was not consumed by following the page
        assert_eq!(data.contract_data.remaining(), 1);
    }

    #[test]
    fn test_next_request_reports_exhaustion_and_finish() {
        let task = find_task(CATALOG, "patient_test_hashed_mbi").unwrap();
        let mut data = data(true);
        assert!(matches!(
            next_request(task, &mut data),
            NextRequest::NoData(FixtureError::Exhausted(_))
        ));
        data.finish_task(task.name);
        assert_eq!(next_request(task, &mut data), NextRequest::Finished);
    }

    #[test]
    fn test_finished_task_leaves_the_others_running() {
        let hashed = find_task(CATALOG, "patient_test_hashed_mbi").unwrap();
        let contract = find_task(CATALOG, "patient_test_coverage_contract").unwrap();
        let by_id = find_task(CATALOG, "patient_test_id").unwrap();
        let mut data = data(true);
        data.set_next_page(
            contract.name,
            Some(PendingPage {
                url: "https://bfd/v2/fhir/Patient?page=2".into(),
                headers: vec![("IncludeIdentifiers", "mbi")],
            }),
        );

        assert!(matches!(next_request(hashed, &mut data), NextRequest::NoData(_)));
        data.finish_task(hashed.name);

        assert_eq!(
            next_request(by_id, &mut data),
            NextRequest::Send {
                url: "/v2/fhir/Patient?_id=-1&_format=application%2Ffhir%2Bjson".into(),
                headers: Vec::new(),
                follow_pages: false,
            }
        );
        assert!(matches!(
            next_request(contract, &mut data),
            NextRequest::Send { follow_pages: true, .. }
        ));
        assert_eq!(data.finished_tasks(), 1);
    }

    #[tokio::test]
    async fn test_run_rejects_empty_selection() {
        let config = SuiteConfig {
            host: Some("http://127.0.0.1:9".into()),
            fixture_file: Some("unused.json".into()),
            ..SuiteConfig::default()
        };
        let fixtures = Fixtures::new(Vec::new(), Vec::new(), Vec::new());
        let err = run(&config, &[], fixtures).await.unwrap_err();
        assert_eq!(err.to_string(), "no tasks selected");
    }

    #[test]
    fn test_completion_fires_on_last_user() {
        let completion = Completion::new(2);
        assert!(!completion.user_finished());
        assert!(completion.user_finished());
    }
}
