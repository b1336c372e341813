//! # Synchronization Verification Tests
//!
//! End-to-end checks of the matching core through the public API:
//!
//! 1. **Identities**: deterministic, deduplicated, first-come-first-served
//! 2. **Lifecycle**: ID recycling only after a full pass
//! 3. **Subscriptions**: late join, notification order, deferred commands
//!
//! Run with: cargo test --test synchronization

use std::sync::Arc;

use parking_lot::Mutex;
use tessera_core::{
    AspectBuilder, BitComposition, Component, ComponentType, CompositionId,
    CompositionIdentityResolver, DeferredCommands, EntityEdit, EntityId, SharedWorld,
    SubscriptionListener, World,
};

struct Position;
impl Component for Position {}

struct Velocity;
impl Component for Velocity {}

struct Frozen;
impl Component for Frozen {}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Event {
    Inserted(Vec<EntityId>),
    Removed(Vec<EntityId>),
}

#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl SubscriptionListener for Recorder {
    fn inserted(&mut self, entities: &[EntityId], _commands: &mut DeferredCommands) {
        self.events.lock().push(Event::Inserted(entities.to_vec()));
    }

    fn removed(&mut self, entities: &[EntityId], _commands: &mut DeferredCommands) {
        self.events.lock().push(Event::Removed(entities.to_vec()));
    }
}

struct Types {
    position: ComponentType,
    velocity: ComponentType,
    frozen: ComponentType,
}

fn setup() -> (World, Types) {
    let mut world = World::new();
    let types = Types {
        position: world.registry_mut().register::<Position>(),
        velocity: world.registry_mut().register::<Velocity>(),
        frozen: world.registry_mut().register::<Frozen>(),
    };
    (world, types)
}

// ============================================================================
// COMPOSITION IDENTITIES
// ============================================================================

#[test]
fn verify_identity_determinism() {
    let mut resolver = CompositionIdentityResolver::new();

    let a: BitComposition = [0, 3].into_iter().collect();
    let b: BitComposition = [3, 0].into_iter().collect();
    let c: BitComposition = [1].into_iter().collect();

    let first = resolver.identity_for(&c);
    let id_a = resolver.identity_for(&a);
    let id_b = resolver.identity_for(&b);

    assert_eq!(id_a, id_b);
    assert_ne!(id_a, first);
    assert_eq!(first, CompositionId::new(2));
    assert_eq!(id_a, CompositionId::new(3));
    assert_eq!(resolver.identity_for(&BitComposition::new()), CompositionId::EMPTY);
}

#[test]
fn verify_identity_ignores_capacity() {
    let mut resolver = CompositionIdentityResolver::new();

    let mut grown = BitComposition::with_capacity(512);
    grown.set(2);
    grown.set(400);
    grown.clear(400);
    let small: BitComposition = [2].into_iter().collect();

    assert_eq!(resolver.identity_for(&grown), resolver.identity_for(&small));
}

#[test]
fn verify_shared_identity_across_entities() {
    let (mut world, t) = setup();

    let e0 = world.create();
    let e1 = world.create();
    world.edit(e0).unwrap().add(t.position).add(t.velocity);
    world.edit(e1).unwrap().add(t.velocity).add(t.position);
    world.synchronize().unwrap();

    assert_eq!(
        world.composition_identity(e0).unwrap(),
        world.composition_identity(e1).unwrap()
    );
}

// ============================================================================
// ASPECTS
// ============================================================================

#[test]
fn verify_aspect_correctness_table() {
    let (mut world, t) = setup();

    let guarded = world
        .subscribe(&AspectBuilder::new().require([t.position]).exclude([t.frozen]))
        .unwrap();
    let either = world
        .subscribe(&AspectBuilder::new().require_one([t.position, t.frozen]))
        .unwrap();

    let x = world.create();
    world.edit(x).unwrap().add(t.position);
    let xy = world.create();
    world.edit(xy).unwrap().add(t.position).add(t.frozen);
    let empty = world.create();
    let y = world.create();
    world.edit(y).unwrap().add(t.velocity);
    world.synchronize().unwrap();

    assert_eq!(world.subscription(guarded).unwrap().entities(), &[x]);
    assert_eq!(world.subscription(either).unwrap().entities(), &[x, xy]);
    assert!(!world.subscription(either).unwrap().contains(empty));
    assert!(!world.subscription(either).unwrap().contains(y));
}

#[test]
fn verify_equal_builders_share_subscription() {
    let (mut world, t) = setup();

    let first = world
        .subscribe(&AspectBuilder::new().require([t.position, t.velocity]))
        .unwrap();
    let second = world
        .subscribe(&AspectBuilder::new().require([t.velocity]).require([t.position]))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(world.subscriptions().len(), 2);
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn verify_recycling_after_full_pass() {
    let (mut world, _) = setup();

    let ids: Vec<_> = (0..3).map(|_| world.create()).collect();
    assert_eq!(ids, vec![EntityId::new(0), EntityId::new(1), EntityId::new(2)]);
    world.synchronize().unwrap();

    world.delete(ids[1]).unwrap();
    world.synchronize().unwrap();

    assert_eq!(world.create(), EntityId::new(1));
    assert_eq!(world.create(), EntityId::new(3));
}

#[test]
fn verify_no_reuse_before_pass() {
    let (mut world, _) = setup();

    let e = world.create();
    world.synchronize().unwrap();
    world.delete(e).unwrap();

    assert!(world.is_active(e));
    assert_eq!(world.create(), EntityId::new(1));
}

#[test]
fn verify_create_then_delete_before_sync() {
    let (mut world, t) = setup();
    let recorder = Recorder::default();
    let all = world.all_entities();
    world.add_listener(all, recorder.clone()).unwrap();

    let e = world.create();
    world.edit(e).unwrap().add(t.position);
    world.delete(e).unwrap();

    assert_eq!(world.synchronize().unwrap(), 1);
    assert_eq!(world.subscriptions().deleted_ids(), &[e]);
    assert!(recorder.take().is_empty());
    assert!(!world.is_active(e));
    assert_eq!(world.create(), e);
}

#[test]
fn verify_deleted_entity_reported_removed() {
    let (mut world, t) = setup();
    let movers = world
        .subscribe(&AspectBuilder::new().require([t.position]))
        .unwrap();

    let e = world.create();
    world.edit(e).unwrap().add(t.position);
    world.synchronize().unwrap();

    let recorder = Recorder::default();
    world.add_listener(movers, recorder.clone()).unwrap();
    world.delete(e).unwrap();
    world.synchronize().unwrap();

    assert_eq!(recorder.take(), vec![Event::Removed(vec![e])]);
    assert!(world.subscription(movers).unwrap().entities().is_empty());
}

// ============================================================================
// EDITS
// ============================================================================

#[test]
fn verify_edit_idempotence() {
    let (mut world, t) = setup();

    let e = world.create();
    world.edit(e).unwrap().add(t.velocity);
    world.synchronize().unwrap();
    let before = world.composition_identity(e).unwrap();

    let first: *const EntityEdit = world.edit(e).unwrap();
    let second: *const EntityEdit = world.edit(e).unwrap();
    assert_eq!(first, second);

    world.edit(e).unwrap().add(t.position);
    world.edit(e).unwrap().remove(t.position);
    world.synchronize().unwrap();

    assert_eq!(world.composition_identity(e).unwrap(), before);
}

#[test]
fn verify_edit_seeded_from_current_composition() {
    let (mut world, t) = setup();

    let e = world.create();
    world.edit(e).unwrap().add(t.position).add(t.velocity);
    world.synchronize().unwrap();

    let edit = world.edit(e).unwrap();
    assert!(edit.has(t.position));
    assert!(edit.has(t.velocity));
    assert!(!edit.has(t.frozen));
}

// ============================================================================
// SUBSCRIPTIONS
// ============================================================================

#[test]
fn verify_late_join_consistency() {
    let (mut world, t) = setup();

    let e0 = world.create();
    world.edit(e0).unwrap().add(t.position);
    let e1 = world.create();
    world.edit(e1).unwrap().add(t.velocity);
    world.synchronize().unwrap();

    let late = world
        .subscribe(&AspectBuilder::new().require([t.position]))
        .unwrap();

    assert!(world.subscription(late).unwrap().contains(e0));
    assert!(!world.subscription(late).unwrap().contains(e1));
    assert_eq!(world.synchronize().unwrap(), 0);
}

#[test]
fn verify_late_join_sees_unsynchronized_entities() {
    let (mut world, t) = setup();

    let e = world.create();
    world.edit(e).unwrap().add(t.position);

    let late = world
        .subscribe(&AspectBuilder::new().require([t.position]))
        .unwrap();
    assert!(world.subscription(late).unwrap().contains(e));
}

#[test]
fn verify_empty_entities_match_after_other_compositions() {
    let (mut world, t) = setup();
    let all = world.all_entities();
    let recorder = Recorder::default();
    world.add_listener(all, recorder.clone()).unwrap();
    let unfrozen = world
        .subscribe(&AspectBuilder::new().exclude([t.frozen]))
        .unwrap();

    let moving = world.create();
    world.edit(moving).unwrap().add(t.position);
    let bare = world.create();
    world.synchronize().unwrap();

    assert_eq!(world.subscription(all).unwrap().entities(), &[moving, bare]);
    assert_eq!(world.subscription(unfrozen).unwrap().entities(), &[moving, bare]);
    assert_eq!(recorder.take(), vec![Event::Inserted(vec![moving, bare])]);

    let late = world
        .subscribe(&AspectBuilder::new().exclude([t.velocity]))
        .unwrap();
    assert_eq!(
        world.subscription(late).unwrap().entities(),
        world.subscription(unfrozen).unwrap().entities()
    );
}

#[test]
fn verify_removed_before_inserted() {
    let (mut world, t) = setup();
    let movers = world
        .subscribe(&AspectBuilder::new().require([t.position]))
        .unwrap();

    let e2 = world.create();
    world.edit(e2).unwrap().add(t.position);
    let e3 = world.create();
    world.synchronize().unwrap();

    let recorder = Recorder::default();
    world.add_listener(movers, recorder.clone()).unwrap();

    world.edit(e2).unwrap().remove(t.position);
    world.edit(e3).unwrap().add(t.position);
    world.synchronize().unwrap();

    assert_eq!(
        recorder.take(),
        vec![Event::Removed(vec![e2]), Event::Inserted(vec![e3])]
    );
    assert_eq!(world.subscription(movers).unwrap().entities(), &[e3]);
}

#[test]
fn verify_listener_order_is_registration_order() {
    let (mut world, t) = setup();
    let movers = world
        .subscribe(&AspectBuilder::new().require([t.position]))
        .unwrap();

    struct Tagged(&'static str, Arc<Mutex<Vec<&'static str>>>);
    impl SubscriptionListener for Tagged {
        fn inserted(&mut self, _: &[EntityId], _: &mut DeferredCommands) {
            self.1.lock().push(self.0);
        }
        fn removed(&mut self, _: &[EntityId], _: &mut DeferredCommands) {}
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    world.add_listener(movers, Tagged("first", Arc::clone(&log))).unwrap();
    world.add_listener(movers, Tagged("second", Arc::clone(&log))).unwrap();

    let e = world.create();
    world.edit(e).unwrap().add(t.position);
    world.synchronize().unwrap();

    assert_eq!(*log.lock(), vec!["first", "second"]);
}

#[test]
fn verify_deferred_commands_run_next_round() {
    struct Stamp {
        ty: ComponentType,
    }
    impl SubscriptionListener for Stamp {
        fn inserted(&mut self, entities: &[EntityId], commands: &mut DeferredCommands) {
            for &entity in entities {
                commands.add_component(entity, self.ty);
            }
        }
        fn removed(&mut self, _: &[EntityId], _: &mut DeferredCommands) {}
    }

    let (mut world, t) = setup();
    let movers = world
        .subscribe(&AspectBuilder::new().require([t.position]))
        .unwrap();
    let stamped = world
        .subscribe(&AspectBuilder::new().require([t.position, t.frozen]))
        .unwrap();
    world.add_listener(movers, Stamp { ty: t.frozen }).unwrap();

    let e = world.create();
    world.edit(e).unwrap().add(t.position);

    assert_eq!(world.synchronize().unwrap(), 2);
    assert!(world.subscription(stamped).unwrap().contains(e));
    assert!(world.subscription(movers).unwrap().contains(e));
}

#[test]
fn verify_deferred_delete_from_listener() {
    struct Reaper;
    impl SubscriptionListener for Reaper {
        fn inserted(&mut self, entities: &[EntityId], commands: &mut DeferredCommands) {
            for &entity in entities {
                commands.delete(entity);
            }
        }
        fn removed(&mut self, _: &[EntityId], _: &mut DeferredCommands) {}
    }

    let (mut world, t) = setup();
    let doomed = world
        .subscribe(&AspectBuilder::new().require([t.frozen]))
        .unwrap();
    world.add_listener(doomed, Reaper).unwrap();

    let e = world.create();
    world.edit(e).unwrap().add(t.frozen);
    let survivor = world.create();

    assert_eq!(world.synchronize().unwrap(), 2);
    assert!(!world.is_active(e));
    assert!(world.is_active(survivor));
    assert_eq!(world.subscription(world.all_entities()).unwrap().entities(), &[survivor]);
}

// ============================================================================
// SHARED WORLD
// ============================================================================

#[test]
fn verify_shared_world_frames() {
    let shared = SharedWorld::default();
    let all = shared.with(|world| world.all_entities());

    let worker = shared.clone();
    std::thread::spawn(move || {
        worker.with(|world| {
            world.create();
            world.create();
        });
    })
    .join()
    .unwrap();

    assert_eq!(
        shared.frame(|world| world.subscription(all).unwrap().entities().len()).unwrap(),
        2
    );
    shared.frame(|_| ()).unwrap();
    assert_eq!(shared.frame_count(), 2);
}
