mod common;

use common::raccoon_parameters;
use rabies_abm::prelude::*;
use rabies_abm::{build_context, Direction, RandomStream, SimulationConfig};

fn config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed,
        start_year: 1,
        start_week: 10,
        weeks_to_run: 60,
        species: SpeciesBehavior::Raccoon,
        prune_dead: false,
        initial_density: 1.0,
        report_file: None,
        logging: None,
    }
}

fn run(seed: u64) -> Context {
    let config = config(seed);
    let mut context =
        build_context(&config, raccoon_parameters(), Landscape::hex_grid(6, 6, 3.0).unwrap()).unwrap();
    context.run_weeks(config.weeks_to_run).unwrap();
    context
}

#[test]
fn same_seed_same_population() {
    let first = run(2024);
    let second = run(2024);
    assert_eq!(first.week_summaries(), second.week_summaries());
    assert_eq!(first.living_animals(), second.living_animals());
    for id in first.living_animals() {
        assert_eq!(first.get_animal(id), second.get_animal(id));
    }
}

#[test]
fn different_seeds_diverge() {
    let first = run(1);
    let second = run(2);
    assert_ne!(first.week_summaries(), second.week_summaries());
}

#[test]
fn population_invariants_hold_after_run() {
    let context = run(77);
    let params = raccoon_parameters();
    let landscape = context.landscape().unwrap();
    let now = context.current_time();
    assert_eq!(now, SimTime::new(2, 18).unwrap());

    for id in context.living_animals() {
        let animal = context.get_animal(id).unwrap();
        assert!(animal.is_alive());
        assert!(animal.age_weeks() <= params.max_age(animal.sex()));
        assert!(landscape.cell(animal.cell()).is_ok());
        assert!(context.cell_occupants(animal.cell()).contains(&id));
        // The current cell is always the last one in the history.
        assert_eq!(animal.history().last().unwrap().cell, animal.cell());
        for pair in animal.history().windows(2) {
            assert!(pair[1].time.weeks_since(pair[0].time) >= 0);
        }
        if let Some(parent) = animal.parent() {
            let mother = context.get_animal(parent).unwrap();
            assert!(mother.offspring().contains(&id));
        }
    }
}

#[test]
fn summaries_add_up() {
    let context = run(5);
    let summaries = context.week_summaries();
    assert_eq!(summaries.len(), 60);
    for pair in summaries.windows(2) {
        let (before, after) = (pair[0], pair[1]);
        assert_eq!(after.time, before.time.next());
        assert_eq!(
            after.population,
            before.population + after.births - after.deaths
        );
    }
}

#[test]
fn path_from_every_direction_stays_on_the_grid() {
    let context = run(9);
    let landscape = context.landscape().unwrap();
    let mut stream = RandomStream::new(9);
    for start in landscape.cells().map(|(id, _)| id) {
        for bias in [Direction::North, Direction::SouthWest] {
            let path = landscape.calculate_path(start, 8, bias, &mut stream).unwrap();
            assert!(path.len() <= 8);
            assert!(landscape.calculate_path(start, 0, bias, &mut stream).unwrap().is_empty());
        }
    }
}
