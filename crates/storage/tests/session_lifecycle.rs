#![forbid(unsafe_code)]

use mission_core::model::{RoadmapStep, SetupTask, StepStatus, TaskStatus, Trajectory, TrajectoryStatus};
use mission_core::patch::{RoadmapStepPatch, SetupTaskPatch};
use mission_core::{CollectionKind, ItemId, Mission, MissionId};
use mission_storage::{
    DEFAULT_MISSION_NAME, KvStore, ManualClock, MemoryKv, Missing, MissionRepository,
    SessionManager, StoreConfig, StoreError,
};
use serde_json::json;
use std::collections::BTreeSet;

fn session() -> (SessionManager<MemoryKv>, ManualClock) {
    let clock = ManualClock::starting_at(10_000);
    let repo = MissionRepository::with_clock(MemoryKv::new(), clock.clone());
    let session = SessionManager::open(repo, &StoreConfig::default()).expect("open session");
    (session, clock)
}

fn active_id(session: &SessionManager<MemoryKv>) -> MissionId {
    session.active().id().clone()
}

fn step(id: u32, title: &str, status: StepStatus) -> RoadmapStep {
    RoadmapStep {
        id: ItemId::from(id),
        title: title.to_string(),
        description: None,
        status,
    }
}

fn roadmap_statuses(session: &SessionManager<MemoryKv>) -> Vec<(String, StepStatus)> {
    session
        .active()
        .roadmap()
        .iter()
        .map(|step| (step.id.as_str().to_string(), step.status))
        .collect()
}

fn assert_index_matches_documents(session: &SessionManager<MemoryKv>) {
    let indexed: BTreeSet<String> = session
        .list()
        .expect("list")
        .into_iter()
        .map(|entry| entry.id.as_str().to_string())
        .collect();
    let stored: BTreeSet<String> = session
        .repository()
        .kv()
        .keys_with_prefix("mission/")
        .expect("scan")
        .into_iter()
        .map(|key| key.trim_start_matches("mission/").to_string())
        .collect();
    assert_eq!(indexed, stored);
    for id in &indexed {
        let id = MissionId::try_new(id.clone()).expect("id");
        session.repository().load(&id).expect("indexed mission loads");
    }
}

#[test]
fn cold_start_on_empty_store_creates_default_mission() {
    let (session, _clock) = session();
    assert_eq!(session.active().name(), DEFAULT_MISSION_NAME);
    let listed = session.list().expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(&listed[0].id, session.active().id());
    assert_eq!(
        session.repository().active_id().expect("active id").as_ref(),
        Some(session.active().id())
    );
}

#[test]
fn signal_strength_max_unlocks_roadmap() {
    let (mut session, _clock) = session();
    session.create("Acme").expect("create");
    session
        .add(step(5, "X", StepStatus::Pending))
        .expect("add step");
    session.set_signal_strength(100).expect("set strength");

    let roadmap = session.active().roadmap();
    assert_eq!(
        roadmap.get(&ItemId::from(1)).expect("step 1").status,
        StepStatus::Complete
    );
    assert_eq!(
        roadmap.get(&ItemId::from(2)).expect("step 2").status,
        StepStatus::Active
    );
    assert_eq!(
        roadmap.get(&ItemId::from(3)).expect("step 3").status,
        StepStatus::Locked
    );
    let five = roadmap.get(&ItemId::from(5)).expect("step 5");
    assert_eq!(five.status, StepStatus::Pending);
    assert_eq!(five.title, "X");
    assert_eq!(roadmap.position(&ItemId::from(5)), Some(4));

    let stored = session
        .repository()
        .load(&active_id(&session))
        .expect("load");
    assert_eq!(&stored, session.active());
}

#[test]
fn repeated_max_strength_leaves_roadmap_unchanged() {
    let (mut session, _clock) = session();
    session.set_signal_strength(100).expect("first");
    let roadmap = session.active().roadmap().clone();
    session.set_signal_strength(100).expect("second");
    assert_eq!(session.active().roadmap(), &roadmap);

    session.set_signal_strength(20).expect("lower");
    assert_eq!(session.active().roadmap(), &roadmap);
}

#[test]
fn removing_first_step_at_max_strength_does_not_cascade() {
    let (mut session, _clock) = session();
    session.set_signal_strength(100).expect("strength");
    let removed: RoadmapStep = session.remove(&ItemId::from(1)).expect("remove step 1");
    assert_eq!(removed.status, StepStatus::Complete);

    let expected = vec![
        ("2".to_string(), StepStatus::Active),
        ("3".to_string(), StepStatus::Locked),
        ("4".to_string(), StepStatus::Locked),
    ];
    assert_eq!(roadmap_statuses(&session), expected);

    let id = active_id(&session);
    session.switch_to(&id).expect("reload");
    assert_eq!(roadmap_statuses(&session), expected);
}

#[test]
fn user_edit_of_first_step_survives_at_max_strength() {
    let (mut session, _clock) = session();
    let id = active_id(&session);
    session.set_signal_strength(100).expect("strength");
    session
        .update::<RoadmapStep>(
            &ItemId::from(1),
            RoadmapStepPatch {
                status: Some(StepStatus::Active),
                ..RoadmapStepPatch::default()
            },
        )
        .expect("reopen step 1");
    assert_eq!(
        session.active().roadmap().get(&ItemId::from(1)).expect("step 1").status,
        StepStatus::Active
    );

    let other = session.create("Other").expect("create").id().clone();
    session.switch_to(&other).expect("switch away");
    session.switch_to(&id).expect("switch back");
    assert_eq!(
        session.active().roadmap().get(&ItemId::from(1)).expect("step 1").status,
        StepStatus::Active
    );

    session.set_signal_strength(100).expect("strength again");
    assert_eq!(
        session.active().roadmap().get(&ItemId::from(1)).expect("step 1").status,
        StepStatus::Complete
    );
}

#[test]
fn switch_replaces_active_mission_wholesale() {
    let clock = ManualClock::starting_at(1_000);
    let mut repo = MissionRepository::with_clock(MemoryKv::new(), clock.clone());
    let a = Mission::new(MissionId::try_new("a1").expect("id"), "A", 1_000).expect("A");
    let b = Mission::new(MissionId::try_new("a2").expect("id"), "B", 1_000).expect("B");
    repo.save(&a).expect("save A");
    repo.save(&b).expect("save B");
    repo.set_active_id(a.id()).expect("active");

    let mut session = SessionManager::open(repo, &StoreConfig::default()).expect("open");
    assert_eq!(session.active().id().as_str(), "a1");
    session
        .add(Trajectory {
            id: ItemId::try_new("only-in-a").expect("item id"),
            name: "Nurture".to_string(),
            trigger: "signup".to_string(),
            action: "email".to_string(),
            status: TrajectoryStatus::Active,
        })
        .expect("add trajectory");
    session
        .add(step(9, "A only", StepStatus::Locked))
        .expect("add step");

    let a2 = MissionId::try_new("a2").expect("id");
    session.switch_to(&a2).expect("switch");

    let stored_b = session.repository().load(&a2).expect("load B");
    assert_eq!(session.active(), &stored_b);
    assert!(session.active().trajectories().is_empty());
    assert!(!session.active().roadmap().contains(&ItemId::from(9)));
    assert_eq!(
        session.repository().active_id().expect("active").as_ref(),
        Some(&a2)
    );

    let a1 = MissionId::try_new("a1").expect("id");
    session.switch_to(&a1).expect("switch back");
    assert_eq!(session.active().trajectories().len(), 1);
}

#[test]
fn switch_to_unknown_mission_is_not_found_and_keeps_active() {
    let (mut session, _clock) = session();
    let before = session.active().clone();
    let missing = MissionId::try_new("nope").expect("id");
    let err = session.switch_to(&missing).expect_err("unknown mission");
    match err {
        StoreError::NotFound(Missing::Mission(id)) => assert_eq!(id, missing),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(session.active(), &before);
}

#[test]
fn update_of_missing_setup_task_is_not_found_and_changes_nothing() {
    let (mut session, _clock) = session();
    let before = session.active().clone();
    let err = session
        .update::<SetupTask>(
            &ItemId::try_new("missing").expect("item id"),
            SetupTaskPatch {
                status: Some(TaskStatus::Complete),
                ..SetupTaskPatch::default()
            },
        )
        .expect_err("missing task");
    match err {
        StoreError::NotFound(Missing::Item { collection, id }) => {
            assert_eq!(collection, CollectionKind::SetupTasks);
            assert_eq!(id.as_str(), "missing");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(session.active(), &before);
    assert_eq!(
        session.repository().load(&active_id(&session)).expect("load"),
        before
    );
}

#[test]
fn empty_update_is_a_no_op() {
    let (mut session, _clock) = session();
    let before = session.active().clone();
    session
        .update::<SetupTask>(&ItemId::from(1), SetupTaskPatch::default())
        .expect("empty patch");
    assert_eq!(session.active(), &before);

    let err = session
        .update::<SetupTask>(&ItemId::from(99), SetupTaskPatch::default())
        .expect_err("empty patch on missing item");
    assert!(err.is_not_found());
}

#[test]
fn json_patch_distinguishes_missing_and_null() {
    let (mut session, _clock) = session();
    session
        .update_json::<SetupTask>(&ItemId::from(1), json!({ "category": null }))
        .expect("clear category");
    let task = session
        .active()
        .setup_tasks()
        .get(&ItemId::from(1))
        .expect("task");
    assert_eq!(task.category, None);
    assert_eq!(task.status, TaskStatus::Pending);

    let err = session
        .update_json::<SetupTask>(&ItemId::from(1), json!({ "status": null }))
        .expect_err("null status");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn add_then_remove_restores_collection() {
    let (mut session, _clock) = session();
    let before = session.active().setup_tasks().clone();
    session
        .add(SetupTask {
            id: ItemId::from(10),
            title: "Trademark".to_string(),
            category: Some("legal".to_string()),
            status: TaskStatus::Pending,
        })
        .expect("add");
    let removed: SetupTask = session.remove(&ItemId::from(10)).expect("remove");
    assert_eq!(removed.title, "Trademark");
    assert_eq!(session.active().setup_tasks(), &before);

    let err = session
        .remove::<SetupTask>(&ItemId::from(10))
        .expect_err("second remove");
    assert!(err.is_not_found());
}

#[test]
fn duplicate_add_is_rejected() {
    let (mut session, _clock) = session();
    let err = session
        .add(step(1, "Again", StepStatus::Locked))
        .expect_err("duplicate");
    match err {
        StoreError::DuplicateId { collection, id } => {
            assert_eq!(collection, CollectionKind::Roadmap);
            assert_eq!(id, ItemId::from(1));
        }
        other => panic!("expected DuplicateId, got {other:?}"),
    }
}

#[test]
fn every_mutation_bumps_last_updated() {
    let (mut session, _clock) = session();
    let mut last = session.active().last_updated();
    session.set_business_plan("Sell rockets").expect("plan");
    assert!(session.active().last_updated() > last);
    last = session.active().last_updated();
    session.set_onboarding_completed(true).expect("onboarding");
    assert!(session.active().last_updated() > last);
    last = session.active().last_updated();
    session
        .replace_all::<RoadmapStep>(vec![step(1, "Only", StepStatus::Active)])
        .expect("replace");
    assert!(session.active().last_updated() > last);
    assert_eq!(session.active().roadmap().len(), 1);
}

#[test]
fn rename_updates_the_index() {
    let (mut session, _clock) = session();
    session.set_name("Acme Labs").expect("rename");
    let listed = session.list().expect("list");
    assert_eq!(listed[0].name, "Acme Labs");
    assert!(session.set_name("   ").is_err());
    assert_eq!(session.active().name(), "Acme Labs");
}

#[test]
fn out_of_range_progress_is_rejected() {
    let (mut session, _clock) = session();
    let err = session.set_ignition_progress(101).expect_err("out of range");
    assert!(matches!(err, StoreError::InvalidInput(_)));
    session.set_ignition_progress(64).expect("in range");
    assert_eq!(session.active().ignition_progress().get(), 64);
}

#[test]
fn deleting_active_falls_back_to_most_recently_accessed() {
    let (mut session, _clock) = session();
    let a = session.create("A").expect("A").id().clone();
    let b = session.create("B").expect("B").id().clone();
    let c = session.create("C").expect("C").id().clone();
    session.switch_to(&b).expect("to B");
    session.switch_to(&a).expect("to A");

    session.delete(&a).expect("delete A");
    assert_eq!(session.active().id(), &b);
    assert!(session.repository().load(&a).expect_err("gone").is_not_found());
    assert_eq!(
        session.repository().active_id().expect("active").as_ref(),
        Some(&b)
    );

    let listed: Vec<_> = session.list().expect("list").into_iter().map(|e| e.id).collect();
    assert_eq!(listed[0], b);
    assert!(listed.contains(&c));
    assert!(!listed.contains(&a));
    assert_index_matches_documents(&session);
}

#[test]
fn deleting_the_only_mission_creates_a_default() {
    let (mut session, _clock) = session();
    let only = active_id(&session);
    session.delete(&only).expect("delete");
    assert_ne!(session.active().id(), &only);
    assert_eq!(session.active().name(), DEFAULT_MISSION_NAME);
    let listed = session.list().expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(&listed[0].id, session.active().id());
    assert_index_matches_documents(&session);
}

#[test]
fn deleting_an_inactive_mission_keeps_active() {
    let (mut session, _clock) = session();
    let first = active_id(&session);
    session.create("Second").expect("create");
    let active_before = session.active().clone();
    session.delete(&first).expect("delete first");
    assert_eq!(session.active(), &active_before);

    let err = session.delete(&first).expect_err("already deleted");
    assert!(err.is_not_found());
}

#[test]
fn index_and_documents_agree_after_create_delete_sequences() {
    let (mut session, _clock) = session();
    let mut created = Vec::new();
    for name in ["A", "B", "C", "D"] {
        created.push(session.create(name).expect("create").id().clone());
        assert_index_matches_documents(&session);
    }
    session.delete(&created[1]).expect("delete B");
    assert_index_matches_documents(&session);
    session.delete(&created[3]).expect("delete active D");
    assert_index_matches_documents(&session);
    session.create("E").expect("create E");
    session.delete(&created[0]).expect("delete A");
    assert_index_matches_documents(&session);
    assert_eq!(session.list().expect("list").len(), 3);
}

#[test]
fn export_and_import_snapshot() {
    let (mut session, _clock) = session();
    session.create("Acme Rockets").expect("create");
    session.set_business_strategy(Some("Direct sales".to_string())).expect("strategy");
    let original = session.active().clone();

    let snapshot = session.export_snapshot().expect("export");
    assert_eq!(snapshot.file_name, "acme-rockets.mission.json");
    let value: serde_json::Value = serde_json::from_slice(&snapshot.bytes).expect("json");
    assert_eq!(value["businessStrategy"], "Direct sales");

    let imported = session
        .import_snapshot(&snapshot.bytes)
        .expect("import")
        .clone();
    assert_ne!(imported.id(), original.id());
    assert_eq!(imported.name(), original.name());
    assert_eq!(imported.roadmap(), original.roadmap());
    assert_eq!(session.list().expect("list").len(), 3);
    assert_index_matches_documents(&session);

    let err = session.import_snapshot(b"not json").expect_err("garbage");
    assert!(matches!(err, StoreError::InvalidInput(_)));
    assert_eq!(session.active(), &imported);
}

#[test]
fn import_rejects_repeated_item_ids_and_blank_names() {
    let (mut session, _clock) = session();
    let before = session.active().clone();
    let listed = session.list().expect("list");
    let snapshot = session.export_snapshot().expect("export");

    let mut value: serde_json::Value = serde_json::from_slice(&snapshot.bytes).expect("json");
    let first = value["setupTasks"][0].clone();
    value["setupTasks"].as_array_mut().expect("tasks").push(first);
    let bytes = serde_json::to_vec(&value).expect("encode");
    let err = session.import_snapshot(&bytes).expect_err("repeated id");
    assert!(matches!(err, StoreError::InvalidInput(_)), "got {err:?}");

    let mut value: serde_json::Value = serde_json::from_slice(&snapshot.bytes).expect("json");
    value["name"] = json!("");
    let bytes = serde_json::to_vec(&value).expect("encode");
    let err = session.import_snapshot(&bytes).expect_err("blank name");
    assert!(matches!(err, StoreError::InvalidInput(_)), "got {err:?}");

    assert_eq!(session.active(), &before);
    assert_eq!(session.list().expect("list"), listed);
}

#[test]
fn user_profile_is_independent_of_missions() {
    let (mut session, _clock) = session();
    assert_eq!(session.user_profile().expect("profile"), None);
    let profile = mission_core::UserProfile {
        id: "u1".to_string(),
        display_name: "Ada".to_string(),
        email: Some("ada@example.com".to_string()),
    };
    session.set_user_profile(&profile).expect("save profile");
    let only = active_id(&session);
    session.delete(&only).expect("delete mission");
    assert_eq!(session.user_profile().expect("profile"), Some(profile));
    assert!(session.clear_user_profile().expect("clear"));
    assert_eq!(session.user_profile().expect("profile"), None);
}
