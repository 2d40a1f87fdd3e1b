extern crate gridphase;

use gridphase::{
    Events, InteractionManager, NarrowPhase, Pair, PairState, Shape, ShapeOverlap, WithinRange};

use itertools::Itertools;
use rand::prelude::*;

type Scene = Vec<(u32, Shape<f32>)>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pair(lhs: u32, rhs: u32) -> Pair<u32> {
    Pair::new(lhs, rhs).unwrap()
}

fn random_scene(prng: &mut rand_chacha::ChaChaRng, n: u32) -> Scene {
    (0..n)
        .map(|id| {
            let x = prng.gen_range(0f32, 200f32);
            let y = prng.gen_range(0f32, 200f32);
            let shape = if prng.gen_bool(0.5) {
                Shape::circle(x, y, prng.gen_range(0f32, 4f32))
            } else {
                Shape::aabb(x, y, prng.gen_range(0f32, 4f32), prng.gen_range(0f32, 4f32))
            };
            (id, shape)
        })
        .collect()
}

fn jitter(prng: &mut rand_chacha::ChaChaRng, scene: &mut Scene) {
    for (_, shape) in scene.iter_mut() {
        shape.position.x += prng.gen_range(-3f32, 3f32);
        shape.position.y += prng.gen_range(-3f32, 3f32);
    }
}

fn brute_force<N: NarrowPhase<u32, f32>>(narrow_phase: &N, scene: &Scene) -> Vec<Pair<u32>> {
    scene.iter()
        .tuple_combinations()
        .filter_map(|(&(lhs, ref lhs_shape), &(rhs, ref rhs_shape))| {
            let pair = Pair::new(lhs, rhs)?;
            if narrow_phase.confirms(pair, lhs_shape, rhs_shape) {
                Some(pair)
            } else {
                None
            }
        })
        .sorted()
        .collect()
}

#[test]
fn scenario() {
    init_logging();
    let mut manager = InteractionManager::<u32, f32, _>::new(10f32).unwrap();

    let mut scene = vec![
        (1, Shape::circle(1f32, 1f32, 1f32)),
        (2, Shape::circle(2f32, 2f32, 1f32)),
        (3, Shape::circle(90f32, 90f32, 1f32)),
        (4, Shape::circle(5f32, 95f32, 1f32)),
        (5, Shape::circle(95f32, 5f32, 1f32))];

    let events = manager.tick(scene.clone()).unwrap().clone();
    assert_eq!(events.started, vec![pair(1, 2)]);
    assert!(events.ongoing.is_empty());
    assert!(events.ended.is_empty());

    scene[3].1 = Shape::circle(91f32, 91f32, 1f32);
    let events = manager.tick(scene.clone()).unwrap().clone();
    assert_eq!(events.started, vec![pair(3, 4)]);
    assert_eq!(events.ongoing, vec![pair(1, 2)]);
    assert!(events.ended.is_empty());
    assert_eq!(manager.state(pair(3, 4)), Some(PairState::Started));
    assert_eq!(manager.state(pair(1, 2)), Some(PairState::Ongoing));
}

#[test]
fn lifecycle() {
    init_logging();
    let mut manager = InteractionManager::<u32, f32, _>::new(10f32).unwrap();
    let apart = vec![
        (1, Shape::circle(0f32, 0f32, 1f32)),
        (2, Shape::circle(50f32, 0f32, 1f32))];
    let together = vec![
        (1, Shape::circle(0f32, 0f32, 1f32)),
        (2, Shape::circle(1f32, 0f32, 1f32))];

    assert!(manager.tick(apart.clone()).unwrap().is_empty());
    assert_eq!(manager.tick(together.clone()).unwrap(), &Events{
        ended: vec![],
        ongoing: vec![],
        started: vec![pair(1, 2)],
    });
    assert_eq!(manager.tick(together).unwrap(), &Events{
        ended: vec![],
        ongoing: vec![pair(1, 2)],
        started: vec![],
    });
    assert_eq!(manager.tick(apart).unwrap(), &Events{
        ended: vec![pair(1, 2)],
        ongoing: vec![],
        started: vec![],
    });
    assert!(manager.registry().is_empty());
}

#[test]
fn deregistration_ends_pairs() {
    init_logging();
    let mut manager = InteractionManager::<u32, f32, _>::new(10f32).unwrap();
    manager.tick(vec![
        (1, Shape::circle(0f32, 0f32, 2f32)),
        (2, Shape::circle(1f32, 1f32, 2f32)),
        (3, Shape::circle(40f32, 40f32, 2f32))]).unwrap();
    assert_eq!(manager.len(), 3);

    let events = manager.tick(vec![
        (1, Shape::circle(0f32, 0f32, 2f32)),
        (3, Shape::circle(40f32, 40f32, 2f32))]).unwrap().clone();
    assert_eq!(events.ended, vec![pair(1, 2)]);
    assert!(events.started.is_empty() && events.ongoing.is_empty());
    assert_eq!(manager.len(), 2);
    assert!(!manager.index().contains(2));

    let events = manager.tick(vec![]).unwrap().clone();
    assert!(events.is_empty());
    assert!(manager.is_empty());
    assert_eq!(manager.index().occupied_cell_count(), 0);
}

#[test]
fn handle_can_return_after_removal() {
    let mut manager = InteractionManager::<u32, f32, _>::new(10f32).unwrap();
    let both = vec![
        (1, Shape::circle(0f32, 0f32, 1f32)),
        (2, Shape::circle(1f32, 0f32, 1f32))];
    manager.tick(both.clone()).unwrap();
    manager.tick(vec![(1, Shape::circle(0f32, 0f32, 1f32))]).unwrap();
    let events = manager.tick(both).unwrap();
    assert_eq!(events.started, vec![pair(1, 2)]);
}

#[test]
fn matches_brute_force() {
    init_logging();
    let mut prng = rand_chacha::ChaChaRng::seed_from_u64(0);
    let mut scene = random_scene(&mut prng, 500);
    let mut manager = gridphase::Config::new(8f32)
        .with_object_capacity(500)
        .build(ShapeOverlap)
        .unwrap();

    let mut previous: Vec<Pair<u32>> = Vec::new();
    for _ in 0..20 {
        let expected = brute_force(&ShapeOverlap, &scene);
        let events = manager.tick(scene.iter().cloned()).unwrap().clone();

        let mut current: Vec<Pair<u32>> = events.started.iter()
            .chain(events.ongoing.iter())
            .copied()
            .collect();
        current.sort_unstable();
        assert_eq!(current, expected);

        let ended: Vec<Pair<u32>> = previous.iter()
            .copied()
            .filter(|pair| expected.binary_search(pair).is_err())
            .collect();
        assert_eq!(events.ended, ended);

        for &started in events.started.iter() {
            assert!(previous.binary_search(&started).is_err());
        }

        previous = expected;
        jitter(&mut prng, &mut scene);
    }
}

#[test]
fn within_range_matches_brute_force() {
    init_logging();
    let mut prng = rand_chacha::ChaChaRng::seed_from_u64(1);
    let scene = random_scene(&mut prng, 400);
    let narrow_phase = WithinRange::new(6f32);
    let mut manager = gridphase::Config::new(6f32)
        .build(narrow_phase)
        .unwrap();

    let events = manager.tick(scene.iter().cloned()).unwrap();
    assert_eq!(events.started, brute_force(&narrow_phase, &scene));
}

#[test]
fn custom_predicate() {
    let mut manager = gridphase::Config::new(10f32)
        .build(|pair: Pair<u32>, _: &Shape<f32>, _: &Shape<f32>| pair.rhs() - pair.lhs() == 1)
        .unwrap();
    let events = manager.tick(vec![
        (1, Shape::point(1f32, 1f32)),
        (2, Shape::point(2f32, 2f32)),
        (4, Shape::point(3f32, 3f32)),
        (5, Shape::point(50f32, 50f32))]).unwrap();
    assert_eq!(events.started, vec![pair(1, 2)]);
}

#[cfg(feature="parallel")]
#[test]
fn par_tick_matches_tick() {
    init_logging();
    let mut prng = rand_chacha::ChaChaRng::seed_from_u64(2);
    let mut scene = random_scene(&mut prng, 1000);
    let mut serial = gridphase::Config::new(8f32).build(ShapeOverlap).unwrap();
    let mut parallel = gridphase::Config::new(8f32).build(ShapeOverlap).unwrap();

    for _ in 0..10 {
        let expected = serial.tick(scene.iter().cloned()).unwrap().clone();
        let actual = parallel.par_tick(scene.iter().cloned()).unwrap().clone();
        assert_eq!(actual, expected);
        jitter(&mut prng, &mut scene);
    }
}
