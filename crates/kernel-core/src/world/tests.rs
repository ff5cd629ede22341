use contracts::{Cue, FailureReason, ItemTag, LocationId, LoopPhase, NeedKind, PlanSource};

use crate::entity::{ItemSpec, Latch, Owner};
use crate::needs::Need;
use crate::spatial::DOOR_CLOSED_REASON;

use super::*;

fn config() -> SimConfig {
    SimConfig {
        start_time: 1_000.0,
        ..SimConfig::default()
    }
}

/// Two rooms joined east/west; the player stands in `a`.
fn two_rooms(visible: bool) -> (WorldBuilder, LocationId, LocationId) {
    let mut b = WorldBuilder::new(config());
    let a = b.location("the study", "Books everywhere.", &[]);
    let c = b.location("the kitchen", "Smells of onions.", &[]);
    b.connect(a, c, "east", "west", visible, false).unwrap();
    b.player(Actor::player("User"), a).unwrap();
    (b, a, c)
}

#[test]
fn building_without_a_player_fails() {
    let b = WorldBuilder::new(config());
    assert_eq!(b.build().unwrap_err(), WorldError::MissingPlayer);
}

#[test]
fn construction_errors_surface_at_build_time() {
    let (mut b, a, c) = two_rooms(true);
    assert_eq!(
        b.connect(c, a, "west", "east", true, true),
        Err(WorldError::DuplicateConnection { a: c, b: a })
    );
    let lockable = Latch {
        lockable: true,
        ..Latch::closed()
    };
    let err = b
        .item(
            ItemSpec::new("strongbox")
                .tags([ItemTag::Container])
                .latch(lockable),
            Owner::Location(a),
        )
        .unwrap_err();
    assert!(matches!(err, WorldError::LockWithoutKey(_)));
    assert_eq!(
        b.item(ItemSpec::new("ghost"), Owner::Location(LocationId(9))),
        Err(WorldError::UnknownLocation(LocationId(9)))
    );
}

#[test]
fn eating_in_place_lowers_need_and_removes_food() {
    let (mut b, _, kitchen) = two_rooms(true);
    let cook = b
        .actor(
            Actor::human("Olga", "woman").with_need(Need::new(NeedKind::Eat, 10.0, 1.0)),
            kitchen,
        )
        .unwrap();
    let stew = b
        .item(ItemSpec::food("stew", 6.0), Owner::Location(kitchen))
        .unwrap();
    let mut world = b.build().unwrap();

    let result = world.act(cook);
    assert!(result.success);
    assert_eq!(result.action, Action::Eat { item: stew });
    let olga = world.actor(cook).unwrap();
    assert_eq!(olga.needs.intensity(NeedKind::Eat), 4.0);
    assert!(world.entities().items_at(kitchen).is_empty());
    assert_eq!(olga.next_eligible(), world.now() + 300.0);
    world.verify().unwrap();
}

#[test]
fn actor_pass_accrues_after_acting() {
    let (mut b, _, kitchen) = two_rooms(true);
    let cook = b
        .actor(
            Actor::human("Olga", "woman").with_need(Need::new(NeedKind::Eat, 10.0, 1.0)),
            kitchen,
        )
        .unwrap();
    b.item(ItemSpec::food("stew", 6.0), Owner::Location(kitchen))
        .unwrap();
    let mut world = b.build().unwrap();

    world.actor_pass();
    let eat = world.actor(cook).unwrap().needs.intensity(NeedKind::Eat);
    assert!((eat - 4.1).abs() < 1e-9);

    // Busy eating: a second pass at the same time leaves needs untouched.
    world.actor_pass();
    let eat = world.actor(cook).unwrap().needs.intensity(NeedKind::Eat);
    assert!((eat - 4.1).abs() < 1e-9);
}

#[test]
fn failed_take_keeps_inventory_and_costs_time() {
    let (mut b, study, _) = two_rooms(true);
    let desk = b
        .item(ItemSpec::new("desk"), Owner::Location(study))
        .unwrap();
    let mut world = b.build().unwrap();
    let player = world.player();
    let now = world.now();

    world.submit_player_action(Action::Take { item: desk });
    let results = world.actor_pass();
    let take = &results[0];
    assert!(!take.success);
    assert_eq!(
        take.failure,
        Some(FailureReason::MissingTag { tag: ItemTag::Take })
    );
    assert!(world.entities().inventory(player).is_empty());
    assert_eq!(world.actor(player).unwrap().next_eligible(), now + 30.0);
    assert_eq!(world.queued_player_action(), Action::Wait);
    assert_eq!(
        world.report(&results),
        vec!["I try to pick up the desk, but it cannot be used that way (Take).".to_string()]
    );
}

#[test]
fn busy_player_keeps_queued_action() {
    let (b, _, kitchen) = two_rooms(true);
    let mut world = b.build().unwrap();
    let player = world.player();
    world.submit_player_action(Action::Move {
        destination: kitchen,
    });
    world.actor_pass();
    assert_eq!(world.actor(player).unwrap().location, kitchen);

    world.submit_player_action(Action::Look);
    assert!(world.actor_pass().is_empty());
    assert_eq!(world.queued_player_action(), Action::Look);
}

#[test]
fn events_behind_invisible_connections_are_not_reported() {
    for visible in [false, true] {
        let (mut b, _, kitchen) = two_rooms(visible);
        b.actor(
            Actor::human("Olga", "woman").with_need(Need::new(NeedKind::Eat, 10.0, 1.0)),
            kitchen,
        )
        .unwrap();
        b.item(ItemSpec::food("stew", 6.0), Owner::Location(kitchen))
            .unwrap();
        let mut world = b.build().unwrap();

        let results = world.actor_pass();
        assert!(results.iter().any(|r| r.verb() == contracts::Verb::Eat));
        let lines = world.report(&results);
        if visible {
            assert_eq!(lines, vec!["Olga eats the stew.".to_string()]);
        } else {
            assert!(lines.is_empty());
        }
    }
}

#[test]
fn audible_reporting_follows_audible_flag() {
    let (mut b, _, kitchen) = two_rooms(false);
    b.actor(
        Actor::animal("cat").with_need(Need::new(NeedKind::Eat, 10.0, 1.0)),
        kitchen,
    )
    .unwrap();
    b.item(ItemSpec::food("cat food", 6.0), Owner::Location(kitchen))
        .unwrap();
    let mut world = b.build().unwrap();
    world.set_reporter(Reporter::new(false, Cue::Audible));
    let results = world.actor_pass();
    // The connection is not audible either.
    assert!(world.report(&results).is_empty());
}

#[test]
fn due_itinerary_entry_outranks_every_need() {
    let (mut b, study, kitchen) = two_rooms(true);
    let butler = b
        .actor(
            Actor::human("Jeeves", "man").with_need(Need::new(NeedKind::Eat, 400.0, 1.0)),
            study,
        )
        .unwrap();
    b.item(ItemSpec::food("toast", 1.0), Owner::Location(study))
        .unwrap();
    let mut world = b.build().unwrap();
    let now = world.now();
    world.actor_mut(butler).unwrap().itinerary.add(
        now,
        Action::Move {
            destination: kitchen,
        },
    );

    let plan = world.plan_for(butler);
    assert_eq!(plan[0].source, PlanSource::Itinerary);
    assert_eq!(plan[0].priority, world.config().itinerary_urgency);
    assert!(plan[1..].iter().all(|e| e.priority < plan[0].priority));

    let result = world.act(butler);
    assert!(result.success);
    assert!(world.actor(butler).unwrap().itinerary.is_empty());
}

#[test]
fn door_commands_round_trip_the_connection() {
    let mut world = World::hotel(config()).unwrap();
    let room = world.player_actor().unwrap().location;
    let hallway = world.graph().find_location("the second floor hallway").unwrap();
    let doorway = world.graph().connection_between(room, hallway).unwrap();
    assert!(!world.graph().connection(doorway).unwrap().is_blocked());

    world.submit_command("close", Some("door")).unwrap();
    let results = world.actor_pass();
    let close = results
        .iter()
        .find(|r| r.actor == world.player())
        .unwrap();
    assert!(close.success, "{close:?}");
    assert_eq!(
        world.graph().connection(doorway).unwrap().blocked_reason(),
        Some(DOOR_CLOSED_REASON)
    );

    world.run_for(10.0);
    world.submit_command("s", None).unwrap();
    let results = world.run_for(2.0);
    let mine = results
        .iter()
        .find(|r| r.actor == world.player())
        .unwrap();
    assert_eq!(
        mine.failure,
        Some(FailureReason::Blocked {
            reason: DOOR_CLOSED_REASON.to_string()
        })
    );

    world.run_for(60.0);
    world.submit_command("open", Some("door")).unwrap();
    world.run_for(2.0);
    assert!(!world.graph().connection(doorway).unwrap().is_blocked());
}

#[test]
fn commands_resolve_against_surroundings() {
    let world = World::demo(SimConfig::default()).unwrap();
    let alley = world.graph().find_location("the alley").unwrap();
    assert_eq!(
        world.resolve_command("n", None),
        Ok(Action::Move { destination: alley })
    );
    assert_eq!(
        world.resolve_command("go", Some("alley")),
        Ok(Action::Move { destination: alley })
    );
    let fountain = world.entities().items_at(world.player_actor().unwrap().location)[0];
    assert_eq!(
        world.resolve_command("drink", Some("Fountain")),
        Ok(Action::Drink { item: fountain })
    );
    assert_eq!(
        world.resolve_command("take", Some("pie")),
        Err(CommandError::UnknownObject("pie".to_string()))
    );
    assert_eq!(
        world.resolve_command("eat", None),
        Err(CommandError::MissingObject(contracts::Verb::Eat))
    );
    assert_eq!(
        world.resolve_command("dance", None),
        Err(CommandError::UnknownVerb("dance".to_string()))
    );
    assert_eq!(world.resolve_command("look", None), Ok(Action::Look));
}

#[test]
fn catch_up_compresses_a_long_action() {
    let mut world = World::demo(SimConfig::default()).unwrap();
    let fountain = world.entities().items_at(world.player_actor().unwrap().location)[0];
    world.submit_player_action(Action::Drink { item: fountain });

    let mut real = Duration::ZERO;
    let frame = Duration::from_millis(16);
    // Let the player's drink start.
    while world.actor(world.player()).unwrap().next_eligible() <= world.now() {
        world.frame(real);
        real += frame;
    }
    let ready_at = world.actor(world.player()).unwrap().next_eligible();

    let mut frames = 0;
    let mut saw_catch_up = false;
    while world.now() < ready_at && frames < 10_000 {
        world.frame(real);
        saw_catch_up |= world.pacer().phase() == LoopPhase::CatchingUp;
        real += frame;
        frames += 1;
    }
    assert!(saw_catch_up);
    assert!(world.now() >= ready_at);
    assert!(frames < 10_000);

    world.frame(real + frame);
    assert_ne!(world.pacer().phase(), LoopPhase::CatchingUp);
    assert_eq!(world.pacer().counter(), 0.0);
}

#[test]
fn demo_town_runs_and_follows_itinerary() {
    let mut world = World::demo(SimConfig::default()).unwrap();
    let grumph = world.find_actor("Grumph").unwrap();
    let knife = world
        .entities()
        .items()
        .iter()
        .find(|item| item.name == "knife")
        .map(|item| item.id)
        .unwrap();

    world.run_for(2_600.0);
    world.verify().unwrap();
    assert_eq!(world.entities().owner(knife), Some(Owner::Actor(grumph)));
    assert_eq!(world.actor(grumph).unwrap().itinerary.len(), 2);
    assert_eq!(world.clock().display(), "10:03:20 AM");
}

#[test]
fn hotel_cat_eats_its_food() {
    let mut world = World::hotel(config()).unwrap();
    let cat = world.find_actor("cat").unwrap();
    let results = world.run_for(5.0);
    assert!(results
        .iter()
        .any(|r| r.actor == cat && r.verb() == contracts::Verb::Eat && r.success));
    assert!(world.entities().inventory(cat).is_empty());
    let lines = world.report(&results);
    assert!(lines.iter().any(|l| l == "The cat eats the cat food."), "{lines:?}");
}
