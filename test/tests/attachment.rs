/// Attachment: which storages a holder receives, and how a broken module is
/// contained

use proptest::prelude::*;

use tether_shared::{AttachError, RegistryError, StorageHolder, StorageId, StorageRegistries};
use tether_test::{
    init_logger, protocol, AbilityStorage, RealmStorage, TestChunk, TestEntity, TestRegistries,
    TestWorld, WeatherStorage, ABILITIES, CHUNK_AURA, REALM, WORLD_WEATHER,
};

fn ids(raw: &[&str]) -> Vec<StorageId> {
    raw.iter().map(|id| StorageId::parse(id).unwrap()).collect()
}

#[test]
fn living_entity_receives_entity_storages() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(1);

    let attached = registries.entity.attach(&mut entity).unwrap();

    assert_eq!(attached, ids(&[ABILITIES, REALM]));
    assert!(entity.get_storage(&keys.abilities).is_some());
    assert!(entity.get_storage(&keys.realm).is_some());
    assert!(entity.storages().is_attached());
}

#[test]
fn predicate_rejects_inanimate_entity() {
    init_logger();
    let (registries, keys) = protocol();
    let mut arrow = TestEntity::inanimate(2);

    let attached = registries.entity.attach(&mut arrow).unwrap();

    assert!(attached.is_empty(), "an arrow has no abilities");
    assert!(arrow.get_storage(&keys.abilities).is_none());
    assert!(arrow.storages().is_attached());
}

/// A world-only storage is never found on an entity
#[test]
fn world_storage_absent_from_entity() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(3);
    let mut world = TestWorld::overworld();

    registries.entity.attach(&mut entity).unwrap();
    registries.world.attach(&mut world).unwrap();

    assert!(entity.storages().get(&keys.weather).is_none());
    assert!(world.get_storage(&keys.weather).is_some());
}

#[test]
fn chunk_receives_aura() {
    init_logger();
    let (registries, keys) = protocol();
    let mut chunk = TestChunk::new(4, -7);

    let attached = registries.chunk.attach(&mut chunk).unwrap();

    assert_eq!(attached, ids(&[CHUNK_AURA]));
    assert_eq!(chunk.get_storage(&keys.aura).map(|aura| aura.aura()), Some(100));
}

#[test]
fn attach_runs_once_per_holder() {
    init_logger();
    let (registries, _) = protocol();
    let mut entity = TestEntity::living(5);
    registries.entity.attach(&mut entity).unwrap();

    let result = registries.entity.attach(&mut entity);

    match result {
        Err(AttachError::AlreadyAttached { holder }) => assert_eq!(holder, "entity #5"),
        _ => panic!("Expected AlreadyAttached error"),
    }
    assert_eq!(entity.storages().len(), 2, "second attach must not touch storages");
}

/// A panicking predicate only costs its own storage
#[test]
fn predicate_panic_is_isolated() {
    init_logger();
    let mut registries = TestRegistries::builder();
    registries
        .register_entity(
            "broken:storage",
            |_: &TestEntity| -> bool { panic!("predicate exploded") },
            |entity: &TestEntity| RealmStorage::new(entity.holder_ref()),
        )
        .unwrap();
    let realm = registries
        .register_entity(
            REALM,
            |_: &TestEntity| true,
            |entity: &TestEntity| RealmStorage::new(entity.holder_ref()),
        )
        .unwrap();
    let mut entity = TestEntity::living(6);

    let attached = registries.entity.attach(&mut entity).unwrap();

    assert_eq!(attached, ids(&[REALM]));
    assert!(entity.get_storage(&realm).is_some());
}

#[test]
fn factory_panic_is_isolated() {
    init_logger();
    let mut registries = TestRegistries::builder();
    registries
        .world
        .register_always("broken:weather", |_: &TestWorld| -> WeatherStorage {
            panic!("factory exploded")
        })
        .unwrap();
    let weather = registries
        .world
        .register_always(WORLD_WEATHER, |world: &TestWorld| {
            WeatherStorage::new(world.holder_ref())
        })
        .unwrap();
    let mut world = TestWorld::overworld();

    let attached = registries.world.attach(&mut world).unwrap();

    assert_eq!(attached, ids(&[WORLD_WEATHER]));
    assert!(world.get_storage(&weather).is_some());
}

#[test]
fn duplicate_identifier_is_rejected() {
    init_logger();
    let (mut registries, _) = protocol();

    let result = registries.register_entity(
        ABILITIES,
        |_: &TestEntity| true,
        |entity: &TestEntity| AbilityStorage::new(entity.holder_ref()),
    );

    match result {
        Err(RegistryError::DuplicateIdentifier { id, kind }) => {
            assert_eq!(id, ABILITIES);
            assert_eq!(kind, "entity");
        }
        _ => panic!("Expected DuplicateIdentifier error"),
    }
}

/// The same path in different holder kinds is not a duplicate
#[test]
fn identifiers_are_scoped_per_kind() {
    init_logger();
    let mut registries: StorageRegistries<TestEntity, TestChunk, TestWorld> =
        StorageRegistries::builder();

    registries
        .entity
        .register_always("arcana:shared_name", |entity: &TestEntity| {
            RealmStorage::new(entity.holder_ref())
        })
        .unwrap();
    let result = registries
        .world
        .register_always("arcana:shared_name", |world: &TestWorld| {
            WeatherStorage::new(world.holder_ref())
        });

    assert!(result.is_ok());
}

#[test]
fn key_lookup_checks_type() {
    let (registries, _) = protocol();

    assert!(registries.entity.key::<AbilityStorage>(ABILITIES).is_some());
    assert!(registries.entity.key::<RealmStorage>(ABILITIES).is_none());
    assert!(registries.entity.key::<AbilityStorage>("arcana:missing").is_none());
}

proptest! {
    /// Fresh holders built the same way always get the same storages
    #[test]
    fn attachment_is_deterministic(id in any::<i32>(), living in any::<bool>(), runs in 2usize..6) {
        let (registries, _) = protocol();

        let attach_fresh = || {
            let mut entity = if living {
                TestEntity::living(id)
            } else {
                TestEntity::inanimate(id)
            };
            registries.entity.attach(&mut entity).unwrap()
        };

        let first = attach_fresh();
        for _ in 1..runs {
            prop_assert_eq!(&attach_fresh(), &first);
        }
        prop_assert_eq!(first.is_empty(), !living);
    }
}
