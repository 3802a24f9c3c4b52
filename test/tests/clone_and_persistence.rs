/// Identity transitions (death/respawn, mob conversion) and world saved data

use std::fs;

use tether_server::{ManagerConfig, PersistError, SavedStorageFile, StorageManager};
use tether_shared::{HolderKind, LoadSummary, StorageHolder, StorageRegistry};
use tether_test::{init_logger, managers, protocol, RealmStorage, TestEntity, TestWorld, REALM};

#[test]
fn successor_inherits_storages() {
    init_logger();
    let (server, _, keys) = managers(ManagerConfig::default());
    let mut original = TestEntity::living(1);
    server.on_entity_created(&mut original).unwrap();
    {
        let realm = original.get_storage_mut(&keys.realm).unwrap();
        realm.enter_realm("ether");
        realm.tick();
        realm.tick();
    }
    original
        .get_storage_mut(&keys.abilities)
        .unwrap()
        .learn_ability("mend", 5);

    let mut successor = TestEntity::living(2);
    server.on_entity_created(&mut successor).unwrap();
    let summary = server.on_entity_cloned(&original, &mut successor);

    assert_eq!(summary.loaded.len(), 2);
    let realm = successor.get_storage(&keys.realm).unwrap();
    assert_eq!(realm.realm(), "ether");
    assert_eq!(realm.affinity(), 1);
    assert_eq!(realm.ticks_in_realm(), 0, "transient fields reset on load");
    assert_eq!(
        successor
            .get_storage(&keys.abilities)
            .unwrap()
            .ability("mend")
            .map(|ability| ability.level),
        Some(5)
    );
}

/// The copy is deep: later changes to the original do not leak through
#[test]
fn clone_is_independent() {
    init_logger();
    let (server, _, keys) = managers(ManagerConfig::default());
    let mut original = TestEntity::living(1);
    server.on_entity_created(&mut original).unwrap();
    let mut successor = TestEntity::living(2);
    server.on_entity_created(&mut successor).unwrap();
    server.on_entity_cloned(&original, &mut successor);

    original
        .get_storage_mut(&keys.abilities)
        .unwrap()
        .learn_ability("smite", 1);

    assert!(successor
        .get_storage(&keys.abilities)
        .unwrap()
        .ability("smite")
        .is_none());
}

#[test]
fn copy_on_clone_can_be_disabled() {
    init_logger();
    let (server, _, keys) = managers(ManagerConfig {
        copy_on_clone: false,
        ..ManagerConfig::default()
    });
    let mut original = TestEntity::living(1);
    server.on_entity_created(&mut original).unwrap();
    original
        .get_storage_mut(&keys.realm)
        .unwrap()
        .enter_realm("ether");
    let mut successor = TestEntity::living(2);
    server.on_entity_created(&mut successor).unwrap();

    let summary = server.on_entity_cloned(&original, &mut successor);

    assert_eq!(summary, LoadSummary::default());
    assert_eq!(
        successor.get_storage(&keys.realm).unwrap().realm(),
        "mortal"
    );
}

#[test]
fn save_and_restore_entity() {
    init_logger();
    let (server, _, keys) = managers(ManagerConfig::default());
    let mut entity = TestEntity::living(1);
    server.on_entity_created(&mut entity).unwrap();
    entity
        .get_storage_mut(&keys.abilities)
        .unwrap()
        .set_mana(12);

    let document = server.save_holder(&entity);
    let mut reloaded = TestEntity::living(1);
    let summary = server.restore_entity(&mut reloaded, &document);

    assert_eq!(summary.loaded.len(), 2);
    assert_eq!(reloaded.get_storage(&keys.abilities).unwrap().mana(), 12);
}

#[test]
fn world_round_trips_through_saved_file() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let file = SavedStorageFile::new(dir.path().join("data").join("arcana_storages.json"));
    let (server, _, keys) = managers(ManagerConfig::default());

    let mut world = TestWorld::overworld();
    server.on_world_loaded(&mut world).unwrap();
    world
        .get_storage_mut(&keys.weather)
        .unwrap()
        .start_storm("thunder", 1200);
    server.save_world_to(&world, &file).unwrap();

    let mut restarted = TestWorld::overworld();
    server.on_world_loaded(&mut restarted).unwrap();
    let summary = server.restore_world_from(&mut restarted, &file).unwrap();

    assert_eq!(summary.loaded.len(), 1);
    let weather = restarted.get_storage(&keys.weather).unwrap();
    assert_eq!(weather.kind(), "thunder");
    assert_eq!(weather.storm_ticks(), 1200);
}

#[test]
fn missing_saved_file_is_a_fresh_world() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let file = SavedStorageFile::new(dir.path().join("never_written.json"));
    let (server, _, keys) = managers(ManagerConfig::default());
    let mut world = TestWorld::overworld();
    server.on_world_loaded(&mut world).unwrap();

    let summary = server.restore_world_from(&mut world, &file).unwrap();

    assert_eq!(summary, LoadSummary::default());
    assert_eq!(world.get_storage(&keys.weather).unwrap().kind(), "clear");
}

#[test]
fn corrupt_saved_file_is_an_error() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, b"{ \"entries\": [").unwrap();
    let file = SavedStorageFile::new(path);
    let (server, _, _) = managers(ManagerConfig::default());
    let mut world = TestWorld::overworld();

    let result = server.restore_world_from(&mut world, &file);

    match result {
        Err(PersistError::Json(_)) => {}
        _ => panic!("Expected Json error"),
    }
}

/// Entries written by a module that is no longer installed are dropped on
/// restore, the rest come back
#[test]
fn restore_with_missing_module() {
    init_logger();
    let (old_server, _, keys) = managers(ManagerConfig::default());
    let mut entity = TestEntity::living(1);
    old_server.on_entity_created(&mut entity).unwrap();
    entity
        .get_storage_mut(&keys.realm)
        .unwrap()
        .enter_realm("ether");
    let document = old_server.save_holder(&entity);

    let (mut registries, _) = protocol();
    registries.entity = StorageRegistry::new(HolderKind::Entity);
    registries
        .entity
        .register_always(REALM, |entity: &TestEntity| {
            RealmStorage::new(entity.holder_ref())
        })
        .unwrap();
    let new_server = StorageManager::new(registries, ManagerConfig::default());

    let mut reloaded = TestEntity::living(1);
    let summary = new_server.restore_entity(&mut reloaded, &document);

    assert_eq!(summary.dropped, 1);
    assert_eq!(reloaded.get_storage(&keys.realm).unwrap().realm(), "ether");
    assert!(reloaded.get_storage(&keys.abilities).is_none());
}
