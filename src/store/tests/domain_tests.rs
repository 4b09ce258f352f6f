//! Domain-focused tests for store value types.

use crate::clock::FixedClock;
use crate::store::domain::{
    AGENT_STARTED_MESSAGE, Agent, AgentKind, AgentName, AgentStatus, AgentUpdate, ImageName,
    NewRegistry, NewTask, RegistryId, ResourceVersion, StoreDomainError, TaskId, TaskStatus,
    TaskUpdate,
};
use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> FixedClock {
    FixedClock::at(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().expect("valid instant"))
}

#[rstest]
#[case(0)]
#[case(-4)]
fn task_id_rejects_non_positive_values(#[case] raw: i64) {
    assert_eq!(
        TaskId::new(raw),
        Err(StoreDomainError::InvalidId {
            kind: "task",
            value: raw
        })
    );
}

#[rstest]
fn resource_version_next_increments() {
    assert_eq!(ResourceVersion::INITIAL.next(), ResourceVersion::new(2));
}

#[rstest]
#[case("", StoreDomainError::EmptyAgentName)]
#[case("agent one", StoreDomainError::InvalidAgentName("agent one".to_owned()))]
#[case("a/b", StoreDomainError::InvalidAgentName("a/b".to_owned()))]
fn agent_name_rejects_invalid_values(#[case] raw: &str, #[case] expected: StoreDomainError) {
    assert_eq!(AgentName::new(raw), Err(expected));
}

#[rstest]
fn image_name_trims_and_rejects_inner_whitespace() {
    let name = ImageName::new("  nginx:1.25 ").expect("valid image");
    assert_eq!(name.as_str(), "nginx:1.25");
    assert_eq!(
        ImageName::new("nginx 1.25"),
        Err(StoreDomainError::InvalidImageName("nginx 1.25".to_owned()))
    );
    assert_eq!(ImageName::new("   "), Err(StoreDomainError::EmptyImageName));
}

#[rstest]
fn new_task_starts_pending_unless_pinned(clock: FixedClock) {
    let registry = RegistryId::new(1).expect("valid id");
    let task_id = TaskId::new(9).expect("valid id");
    let unpinned = NewTask::new("mirror", "owner", registry).expect("valid task");
    let pinned = unpinned
        .clone()
        .with_agent(AgentName::new("edge-1").expect("valid name"));

    let stored = unpinned.into_task(task_id, mockable::Clock::utc(&clock));
    assert_eq!(stored.status(), TaskStatus::Pending);
    assert!(stored.is_unassigned());
    assert_eq!(stored.resource_version(), ResourceVersion::INITIAL);
    assert_eq!(pinned.initial_status(), TaskStatus::Assigned);
}

#[rstest]
fn task_apply_bumps_version_and_modified_at(clock: FixedClock) {
    let created_at = mockable::Clock::utc(&clock);
    let agent = AgentName::new("edge-1").expect("valid name");
    let mut task = NewTask::new("mirror", "owner", RegistryId::new(1).expect("valid id"))
        .expect("valid task")
        .into_task(TaskId::new(1).expect("valid id"), created_at);

    clock.advance(Duration::seconds(30));
    task.apply(&TaskUpdate::assign_to(agent.clone()), mockable::Clock::utc(&clock));

    assert_eq!(task.resource_version(), ResourceVersion::new(2));
    assert_eq!(task.modified_at(), created_at + Duration::seconds(30));
    assert!(task.awaits_pickup_by(&agent));
}

#[rstest]
fn task_update_can_clear_assignment(clock: FixedClock) {
    let now = mockable::Clock::utc(&clock);
    let mut task = NewTask::new("mirror", "owner", RegistryId::new(1).expect("valid id"))
        .expect("valid task")
        .with_agent(AgentName::new("edge-1").expect("valid name"))
        .into_task(TaskId::new(1).expect("valid id"), now);

    let update = TaskUpdate {
        agent_name: Some(None),
        status: Some(TaskStatus::Pending),
        ..TaskUpdate::default()
    };
    task.apply(&update, now);

    assert!(task.is_unassigned());
}

#[rstest]
fn registered_agent_is_running_with_started_message(clock: FixedClock) {
    let agent = Agent::register(
        AgentName::new("edge-1").expect("valid name"),
        AgentKind::Public,
        &clock,
    );

    assert_eq!(agent.status(), AgentStatus::Running);
    assert_eq!(agent.message(), AGENT_STARTED_MESSAGE);
    assert_eq!(agent.last_heartbeat(), agent.created_at());
}

#[rstest]
fn heartbeat_expiry_is_strictly_after_the_window(clock: FixedClock) {
    let mut agent = Agent::register(
        AgentName::new("edge-1").expect("valid name"),
        AgentKind::Private,
        &clock,
    );
    let window = Duration::minutes(5);
    let registered = agent.last_heartbeat();

    assert!(!agent.heartbeat_expired(registered + window, window));
    assert!(agent.heartbeat_expired(registered + window + Duration::seconds(1), window));

    agent.apply(&AgentUpdate::heartbeat(registered + window));
    assert!(!agent.heartbeat_expired(registered + window + Duration::seconds(1), window));
}

#[rstest]
fn registry_debug_redacts_password() {
    let registry = NewRegistry::new("owner", "harbor.example.com", "mirrors")
        .expect("valid registry")
        .with_credentials("robot", "s3cret");

    let rendered = format!("{registry:?}");

    assert!(!rendered.contains("s3cret"));
    assert_eq!(registry.password(), "s3cret");
}

#[rstest]
#[case("pending", TaskStatus::Pending)]
#[case("assigned", TaskStatus::Assigned)]
#[case("running", TaskStatus::Running)]
#[case("succeeded", TaskStatus::Succeeded)]
#[case("failed", TaskStatus::Failed)]
fn task_status_parses_persisted_values(#[case] raw: &str, #[case] expected: TaskStatus) {
    assert_eq!(TaskStatus::try_from(raw), Ok(expected));
    assert_eq!(expected.as_str(), raw);
}

#[rstest]
fn task_status_rejects_unknown_values() {
    assert!(TaskStatus::try_from("paused").is_err());
}
