//! End-to-end scenarios: commands in, ticks driven, world state out.
//!
//! 1. Actor binding and coordinate targets
//! 2. WITH lists do not survive a THEN
//! 3. Preposition extent
//! 4. WAIT ALL joins, HALT is immediate
//! 5. Deferred words are recovered
//! 6. Parsing is deterministic
//! 7. Movement, repeats, delays, conditions and async clauses over time
//! 8. Scene changes sever old handles

use director_core::{
    Coords, DirectedTo, Director, DirectionStatus, GridWorld, Heading, Host, Target,
};

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

/// A 20x20 room: HERO (the player) at [1,1], A at [5,5], B at [8,8] and X
/// at [10,1].
fn room() -> GridWorld {
    let mut world = GridWorld::new(20, 20);
    let hero = world.spawn("hero", 1, Coords::new(1, 1));
    world.set_player(hero);
    world.spawn("a", 2, Coords::new(5, 5));
    world.spawn("b", 3, Coords::new(8, 8));
    world.spawn("x", 4, Coords::new(10, 1));
    world
}

/// Run `frames` frames the way a host would: entities first, then the
/// Director.
fn run(director: &mut Director, world: &mut GridWorld, frames: usize) {
    for _ in 0..frames {
        for entity in world.update() {
            director.actor_tick(entity);
        }
        director.tick(world);
    }
}

/// Run until nothing is left to do, failing after `limit` frames.
fn run_until_idle(director: &mut Director, world: &mut GridWorld, limit: usize) {
    for _ in 0..limit {
        if director.is_idle() {
            return;
        }
        run(director, world, 1);
    }
    panic!("still busy after {} frames", limit);
}

fn position(world: &GridWorld, name: &str) -> Coords {
    let entity = world
        .find_by_name(name)
        .unwrap_or_else(|| panic!("no entity named {}", name));
    world.position(entity).unwrap()
}

fn actor_names(director: &Director, actors: &[director_core::ActorId]) -> Vec<String> {
    actors
        .iter()
        .map(|a| director.scene().actor(*a).unwrap().name.clone())
        .collect()
}

// ──────────────────────────────────────────────
// Parsing
// ──────────────────────────────────────────────

#[test]
fn player_moves_to_a_coordinate() {
    let world = room();
    let mut director = Director::new();
    let ds = director.parse(&world, "DIRECT PLAYER TO MOVE TO [3,12]");
    assert_eq!(ds.len(), 1);
    let d = &ds[0];
    assert_eq!(d.verb.name, "MOVE");
    assert_eq!(d.directed_to, DirectedTo::Actor);
    assert_eq!(actor_names(&director, &d.actors), vec!["HERO"]);
    assert_eq!(d.targets, vec![Target::Fixed(Coords::new(3, 12))]);
    assert!(director.diagnostics().is_empty());
}

#[test]
fn with_list_is_not_chained() {
    let world = room();
    let mut director = Director::new();
    let ds = director.parse(
        &world,
        "DIRECT PLAYER AND A TO MOVE TO X WITH B THEN FACE NORTH",
    );
    assert_eq!(ds.len(), 2);

    let (walk, face) = (&ds[0], &ds[1]);
    assert_eq!(actor_names(&director, &walk.actors), vec!["HERO", "A"]);
    assert_eq!(actor_names(&director, &walk.with), vec!["B"]);
    assert_eq!(walk.targets.len(), 1);
    assert_eq!(
        walk.targets[0].coords(director.scene(), &world),
        Some(Coords::new(10, 1))
    );

    assert_eq!(face.verb.name, "FACE");
    assert_eq!(actor_names(&director, &face.actors), vec!["HERO", "A"]);
    assert!(face.with.is_empty());
    assert!(face.phrase("NORTH").is_some());
}

#[test]
fn phrase_extent_defaults_to_one() {
    let world = room();
    let mut director = Director::new();
    let ds = director.parse(&world, "DIRECT A TO MOVE WEST 3 STEPS THEN MOVE NORTH");
    assert_eq!(ds[0].phrase("WEST").unwrap().extent(), 3.0);
    assert_eq!(ds[1].phrase("NORTH").unwrap().extent(), 1.0);
}

#[test]
fn word_deferred_in_adverb_state_becomes_a_target() {
    let world = room();
    let mut director = Director::new();
    let ds = director.parse(&world, "DIRECT PLAYER TO MOVE B SLOWLY");
    assert_eq!(ds.len(), 1);
    assert_eq!(ds[0].adverbs, vec!["SLOWLY"]);
    assert_eq!(ds[0].targets.len(), 1);
    assert_eq!(
        ds[0].targets[0].coords(director.scene(), &world),
        Some(Coords::new(8, 8))
    );
    assert!(director.diagnostics().is_empty());
}

#[test]
fn parsing_is_deterministic() {
    let world = room();
    let command = "DIRECT PLAYER AND A TO MOVE QUICKLY NORTH 2 TO [4,4] WITH B";
    let mut first = Director::new();
    let mut second = Director::new();
    let a = first.parse(&world, command);
    let b = second.parse(&world, command);
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.summary(first.scene()), y.summary(second.scene()));
    }
}

#[test]
fn unknown_commands_degrade_to_no_ops() {
    let mut world = room();
    let mut director = Director::new();
    assert!(director.direct(&mut world, "DIRECT NOBODY TO DANCE").is_empty());
    assert!(director.direct(&mut world, "DIRECTOR MOVE NORTH").is_empty());
    assert!(director.is_idle());
    assert!(director.diagnostics().len() >= 2);
}

#[test]
fn parsed_directions_know_whether_they_can_be_waited_on() {
    let world = room();
    let mut director = Director::new();

    let ds = director.parse(&world, "DIRECT PLAYER TO MOVE EAST WHILE FACE NORTH");
    assert_eq!(ds.len(), 2);
    assert!(ds[0].is_async);
    assert!(!ds[0].should_wait_on());
    assert!(!ds[1].is_async);
    assert!(ds[1].should_wait_on());

    let ds = director.parse(&world, "DIRECTOR WAIT ALL");
    assert!(!ds[0].should_wait_on());
    let ds = director.parse(&world, "DIRECTOR HALT ALL");
    assert!(!ds[0].should_wait_on());
}

// ──────────────────────────────────────────────
// Scheduling
// ──────────────────────────────────────────────

#[test]
fn moves_across_the_grid_over_many_ticks() {
    let mut world = room();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT PLAYER TO MOVE TO [3,12] THEN FACE NORTH");
    run_until_idle(&mut director, &mut world, 200);
    assert_eq!(position(&world, "hero"), Coords::new(3, 12));
    let hero = world.player().unwrap();
    assert_eq!(world.facing(hero), Some(Heading::North));
}

#[test]
fn walls_are_walked_around_on_the_diagonal() {
    let mut world = room();
    world.add_wall(Coords::new(2, 2));
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT PLAYER TO MOVE TO [4,4]");
    run_until_idle(&mut director, &mut world, 100);
    assert_eq!(position(&world, "hero"), Coords::new(4, 4));
}

#[test]
fn walking_toward_an_actor_stops_beside_it() {
    let mut world = room();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT A TO MOVE TO B");
    run_until_idle(&mut director, &mut world, 100);
    assert_eq!(position(&world, "a"), Coords::new(7, 7));
}

#[test]
fn quickly_is_undone_once_the_move_finishes() {
    let mut world = room();
    let hero = world.player().unwrap();
    let before = world.move_speed(hero);
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT PLAYER TO MOVE QUICKLY EAST 2");
    run(&mut director, &mut world, 1);
    assert_eq!(world.move_speed(hero), before + 1);
    run_until_idle(&mut director, &mut world, 50);
    assert_eq!(world.move_speed(hero), before);
    assert_eq!(position(&world, "hero"), Coords::new(3, 1));
}

#[test]
fn away_from_walks_the_given_distance() {
    let mut world = room();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT A TO MOVE AWAY FROM B 3");
    run_until_idle(&mut director, &mut world, 100);
    assert_eq!(position(&world, "a"), Coords::new(2, 2));
}

#[test]
fn directions_for_one_actor_run_in_order() {
    let mut world = room();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT A TO MOVE NORTH 2");
    director.direct(&mut world, "DIRECT A TO MOVE EAST 2");
    run(&mut director, &mut world, 4);
    assert_eq!(position(&world, "a"), Coords::new(5, 3));
    run_until_idle(&mut director, &mut world, 50);
    assert_eq!(position(&world, "a"), Coords::new(7, 3));
}

#[test]
fn wait_all_completes_only_after_the_running_direction() {
    let mut world = room();
    let mut director = Director::new();
    let face = director.direct(&mut world, "DIRECT B TO FACE NORTH");
    let walk = director.direct(&mut world, "DIRECT A TO MOVE SOUTH 4");
    run(&mut director, &mut world, 2);
    // The FACE is long gone; the MOVE is still under way.
    assert!(director.scene().direction(face[0]).is_none());
    assert!(director.scene().direction(walk[0]).is_some());

    let wait = director.direct(&mut world, "DIRECTOR WAIT ALL");
    assert!(director.is_waiting());
    while director.scene().direction(walk[0]).is_some() {
        run(&mut director, &mut world, 1);
        let status = director.scene().direction(wait[0]).map(|d| d.state.status());
        if director.scene().direction(walk[0]).is_some() {
            assert_ne!(status, Some(DirectionStatus::Done));
            assert!(director.is_waiting());
        }
    }
    run(&mut director, &mut world, 1);
    assert!(!director.is_waiting());
}

#[test]
fn wait_all_joins_queued_directions_on_one_actor() {
    let mut world = room();
    let a = world.find_by_name("a").unwrap();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT A TO MOVE EAST 3");
    let face = director.direct(&mut world, "DIRECT A TO FACE NORTH");
    let wait = director.direct(&mut world, "DIRECTOR WAIT ALL");
    assert!(director.is_waiting());

    for _ in 0..50 {
        if director.scene().direction(face[0]).is_none() {
            break;
        }
        run(&mut director, &mut world, 1);
        let status = director.scene().direction(wait[0]).map(|d| d.state.status());
        if director.scene().direction(face[0]).is_some() {
            assert_ne!(status, Some(DirectionStatus::Done));
            assert!(director.is_waiting());
        }
    }
    run(&mut director, &mut world, 1);
    assert!(!director.is_waiting());
    assert_eq!(position(&world, "a"), Coords::new(8, 5));
    assert_eq!(world.facing(a), Some(Heading::North));
}

#[test]
fn halt_all_lands_before_the_next_cleanup() {
    let mut world = room();
    let mut director = Director::new();
    let walk = director.direct(&mut world, "DIRECT A TO MOVE EAST 6");
    run(&mut director, &mut world, 1);
    assert_eq!(
        director.scene().direction(walk[0]).map(|d| d.state.status()),
        Some(DirectionStatus::Running)
    );

    director.direct(&mut world, "DIRECTOR HALT ALL");
    let d = director.scene().direction(walk[0]).unwrap();
    assert!(d.state.actions().all(|a| a.is_done()));

    run(&mut director, &mut world, 1);
    assert!(director.scene().direction(walk[0]).is_none());
    run(&mut director, &mut world, 20);
    assert_eq!(position(&world, "a"), Coords::new(6, 5));
}

#[test]
fn repeat_runs_extra_rounds() {
    let mut world = room();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT PLAYER TO MOVE EAST 1 REPEAT 2 TIMES");
    run_until_idle(&mut director, &mut world, 50);
    assert_eq!(position(&world, "hero"), Coords::new(4, 1));
}

#[test]
fn huge_step_counts_walk_to_the_edge() {
    let mut world = room();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT A TO MOVE EAST 3000000000 STEPS");
    director.direct(&mut world, "DIRECT B TO MOVE NORTHWEST 3000000000 STEPS");
    run_until_idle(&mut director, &mut world, 200);
    assert_eq!(position(&world, "a"), Coords::new(19, 5));
    assert_eq!(position(&world, "b"), Coords::new(0, 0));
}

#[test]
fn huge_durations_walk_until_blocked() {
    let mut world = room();
    let mut director = Director::new();
    director.direct(
        &mut world,
        "DIRECT B TO MOVE EAST FOR 99999999999999999999999 FRAMES",
    );
    run_until_idle(&mut director, &mut world, 200);
    assert_eq!(position(&world, "b"), Coords::new(19, 8));
}

#[test]
fn halting_a_huge_repeat_stops_it() {
    let mut world = room();
    let mut director = Director::new();
    let walk = director.direct(
        &mut world,
        "DIRECT A TO MOVE EAST 1 REPEAT 99999999999 TIMES",
    );
    run(&mut director, &mut world, 1);
    director.direct(&mut world, "DIRECTOR HALT ALL");
    run(&mut director, &mut world, 2);
    assert!(director.scene().direction(walk[0]).is_none());
    assert!(director.is_idle());
}

#[test]
fn delays_hold_a_direction_back() {
    let mut world = room();
    let hero = world.player().unwrap();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT PLAYER TO FACE NORTH AFTER 5 FRAMES");
    run(&mut director, &mut world, 4);
    assert_eq!(world.facing(hero), Some(Heading::South));
    run(&mut director, &mut world, 1);
    assert_eq!(world.facing(hero), Some(Heading::North));
}

#[test]
fn conditions_gate_the_start() {
    let mut world = room();
    let hero = world.player().unwrap();
    let b = world.find_by_name("b").unwrap();
    let mut director = Director::new();
    director.direct(&mut world, "DIRECT PLAYER TO FACE EAST WHEN B AT [4,4]");
    run(&mut director, &mut world, 10);
    assert_eq!(world.facing(hero), Some(Heading::South));

    world.place(b, Coords::new(4, 4));
    run(&mut director, &mut world, 1);
    assert_eq!(world.facing(hero), Some(Heading::East));
}

#[test]
fn while_clauses_run_alongside_the_queue() {
    let mut world = room();
    let hero = world.player().unwrap();
    let mut director = Director::new();
    let ids = director.direct(&mut world, "DIRECT PLAYER TO MOVE SOUTH 3 WHILE FACE WEST");
    assert_eq!(ids.len(), 2);
    let walk = director.scene().direction(ids[0]).unwrap();
    assert!(walk.is_async);
    assert!(!walk.should_wait_on());

    run(&mut director, &mut world, 1);
    assert_eq!(position(&world, "hero"), Coords::new(1, 2));
    assert_eq!(world.facing(hero), Some(Heading::West));
    run_until_idle(&mut director, &mut world, 50);
    assert_eq!(position(&world, "hero"), Coords::new(1, 4));
}

#[test]
fn scene_change_severs_old_handles() {
    let mut world = room();
    let mut director = Director::new();
    let ids = director.direct(&mut world, "DIRECT A TO MOVE TO B");
    let actor = director.scene().direction(ids[0]).unwrap().actors[0];
    run(&mut director, &mut world, 3);

    director.change_scene();
    assert!(director.is_idle());
    assert!(director.scene().actor(actor).is_none());
    assert!(Target::Actor(actor).coords(director.scene(), &world).is_none());

    let before = position(&world, "a");
    run(&mut director, &mut world, 20);
    assert_eq!(position(&world, "a"), before);

    let again = director.parse(&world, "DIRECT A TO FACE NORTH");
    assert_ne!(again[0].actors[0], actor);
}
