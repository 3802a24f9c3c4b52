/// Loading documents that are partly broken: every readable entry still
/// loads, only the broken pieces go missing

use tether_shared::{
    CombinedStorage, CompoundTag, StorageHolder, StorageId, Tag, ENTRIES_KEY, ID_KEY,
    RECORDS_KEY, RECORD_KEY_KEY,
};
use tether_test::{init_logger, protocol, TestEntity, TestWorld, ABILITIES, REALM};

fn entry(id: &str, fields: CompoundTag) -> Tag {
    let mut entry = fields;
    entry.put_string(ID_KEY, id);
    Tag::Compound(entry)
}

fn document(entries: Vec<Tag>) -> CompoundTag {
    let mut document = CompoundTag::new();
    document.put_list(ENTRIES_KEY, entries);
    document
}

fn realm_fields(realm: &str, affinity: i32) -> CompoundTag {
    let mut fields = CompoundTag::new();
    fields.put_string("realm", realm);
    fields.put_int("affinity", affinity);
    fields
}

/// Scenario: the only entry names a type nobody registered
#[test]
fn unknown_identifier_on_load() {
    init_logger();
    let (registries, _) = protocol();
    let entity = TestEntity::living(1);
    let mut storages = CombinedStorage::new(entity.holder_ref());
    let doc = document(vec![entry("nonexistent:type", CompoundTag::new())]);

    let summary = storages.load(&doc, |id| registries.entity.construct(id, &entity));

    assert!(storages.is_empty());
    assert!(summary.loaded.is_empty());
    assert_eq!(summary.dropped, 1);
}

#[test]
fn malformed_entry_does_not_block_the_rest() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(2);

    let mut bad_abilities = CompoundTag::new();
    bad_abilities.put_string("mana", "lots");
    let doc = document(vec![
        entry(ABILITIES, bad_abilities),
        Tag::Int(7),
        entry(REALM, realm_fields("ether", 4)),
    ]);

    let summary = registries.entity.load_into(&mut entity, &doc);

    assert_eq!(summary.loaded, vec![StorageId::parse(REALM).unwrap()]);
    assert_eq!(summary.dropped, 2);
    assert!(entity.get_storage(&keys.abilities).is_none());
    let realm = entity.get_storage(&keys.realm).unwrap();
    assert_eq!(realm.realm(), "ether");
    assert_eq!(realm.affinity(), 4);
}

/// A failed load leaves whatever storage was there before in place
#[test]
fn failed_load_keeps_existing_storage() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(3);
    registries.entity.attach(&mut entity).unwrap();
    entity
        .get_storage_mut(&keys.abilities)
        .unwrap()
        .learn_ability("ward", 2);

    let mut bad_abilities = CompoundTag::new();
    bad_abilities.put_int(RECORDS_KEY, 5);
    registries
        .entity
        .load_into(&mut entity, &document(vec![entry(ABILITIES, bad_abilities)]));

    let abilities = entity.get_storage(&keys.abilities).unwrap();
    assert_eq!(abilities.ability("ward").map(|ability| ability.level), Some(2));
}

#[test]
fn entries_without_id_are_dropped() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(4);

    let doc = document(vec![
        Tag::Compound(realm_fields("nowhere", 1)),
        entry("Not A Valid Id", CompoundTag::new()),
        entry(REALM, realm_fields("ether", 2)),
    ]);
    let summary = registries.entity.load_into(&mut entity, &doc);

    assert_eq!(summary.dropped, 2);
    assert_eq!(entity.get_storage(&keys.realm).unwrap().realm(), "ether");
}

/// Inside a storage, one bad sub-record is skipped and its siblings load
#[test]
fn malformed_record_is_isolated() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(5);

    let mut good = CompoundTag::new();
    good.put_string(RECORD_KEY_KEY, "blink");
    good.put_int("level", 3);
    let mut negative = CompoundTag::new();
    negative.put_string(RECORD_KEY_KEY, "smite");
    negative.put_int("level", -1);
    let mut unnamed = CompoundTag::new();
    unnamed.put_int("level", 1);

    let mut abilities = CompoundTag::new();
    abilities.put_list(
        RECORDS_KEY,
        vec![
            Tag::Compound(negative),
            Tag::Compound(unnamed),
            Tag::String("garbage".to_string()),
            Tag::Compound(good),
        ],
    );
    let summary = registries
        .entity
        .load_into(&mut entity, &document(vec![entry(ABILITIES, abilities)]));

    assert_eq!(summary.dropped, 0);
    let abilities = entity.get_storage(&keys.abilities).unwrap();
    assert_eq!(abilities.records().len(), 1);
    assert_eq!(abilities.ability("blink").map(|ability| ability.level), Some(3));
}

#[test]
fn document_without_entries_loads_nothing() {
    init_logger();
    let (registries, _) = protocol();
    let mut world = TestWorld::overworld();

    let summary = registries.world.load_into(&mut world, &CompoundTag::new());

    assert!(summary.loaded.is_empty());
    assert!(world.storages().is_empty());
}

/// Deltas for storages the holder lacks are skipped, the rest still apply
#[test]
fn update_for_missing_storage_is_skipped() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(6);
    registries.entity.attach(&mut entity).unwrap();

    let doc = document(vec![
        entry("arcana:unheard_of", CompoundTag::new()),
        entry(REALM, realm_fields("ether", 9)),
    ]);
    let summary = entity.storages_mut().handle_update_packet(&doc);

    assert_eq!(summary.loaded, vec![StorageId::parse(REALM).unwrap()]);
    assert_eq!(summary.dropped, 1);
    assert_eq!(entity.get_storage(&keys.realm).unwrap().affinity(), 9);
}

/// A delta that fails partway leaves the storage exactly as it was, while
/// other entries in the same packet still apply
#[test]
fn rejected_update_leaves_storage_untouched() {
    init_logger();
    let (registries, keys) = protocol();
    let mut entity = TestEntity::living(7);
    registries.entity.attach(&mut entity).unwrap();
    {
        let abilities = entity.get_storage_mut(&keys.abilities).unwrap();
        abilities.learn_ability("ward", 2);
        abilities.set_mana(5);
    }

    let mut bad_abilities = CompoundTag::new();
    bad_abilities.put_int("mana", 99);
    bad_abilities.put_int(RECORDS_KEY, 5);
    let doc = document(vec![
        entry(ABILITIES, bad_abilities),
        entry(REALM, realm_fields("ether", 3)),
    ]);
    let summary = entity.storages_mut().handle_update_packet(&doc);

    assert_eq!(summary.loaded, vec![StorageId::parse(REALM).unwrap()]);
    assert_eq!(summary.dropped, 1);
    let abilities = entity.get_storage(&keys.abilities).unwrap();
    assert_eq!(abilities.mana(), 5);
    assert_eq!(abilities.ability("ward").map(|ability| ability.level), Some(2));
    assert_eq!(entity.get_storage(&keys.realm).unwrap().realm(), "ether");
}
