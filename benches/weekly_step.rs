use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rabies_abm::species::{DensityDependence, ReproductionPulse, SexAgeTables, SpeciesParameterValues};
use rabies_abm::{build_context, Context, ContextPopulationExt, Landscape, SimulationConfig, SpeciesBehavior, SpeciesParameters};
use std::hint::black_box;

fn fox_parameters() -> SpeciesParameters {
    let mut young_weeks = vec![false; 52];
    for week in 36..=47 {
        young_weeks[week - 1] = true;
    }
    let mut distance = vec![0.0; 50];
    distance[2] = 0.5;
    distance[4] = 0.5;
    SpeciesParameters::new(SpeciesParameterValues {
        name: "red fox".to_string(),
        male_mortality: vec![0.6, 0.5, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
        female_mortality: vec![0.55, 0.45, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
        male_home_range: vec![0.25; 52],
        female_home_range: vec![0.15; 52],
        movement_weeks: SexAgeTables {
            male_young_of_year: young_weeks.clone(),
            male_juvenile_adult: vec![false; 52],
            female_young_of_year: young_weeks,
            female_juvenile_adult: vec![false; 52],
        },
        movement_distance: SexAgeTables {
            male_young_of_year: distance.clone(),
            male_juvenile_adult: distance.clone(),
            female_young_of_year: distance.clone(),
            female_juvenile_adult: distance,
        },
        litter_size_mean: 4.5,
        litter_size_variance: 1.5,
        max_litter_size: 10,
        litter_size_table: None,
        male_percent: 50.0,
        juvenile_birth_odds: 60.0,
        adult_birth_odds: 90.0,
        independence_age: 34,
        adult_age: 104,
        reproduction_pulses: vec![ReproductionPulse {
            mean_week: 16.0,
            variance: 4.0,
        }],
        gestation_period: 0,
        density: DensityDependence::default(),
        max_age: 415,
    })
    .unwrap()
}

fn setup(start_week: u8) -> Context {
    let config = SimulationConfig {
        seed: 8675309,
        start_year: 1,
        start_week,
        weeks_to_run: 0,
        species: SpeciesBehavior::Fox,
        prune_dead: true,
        initial_density: 1.0,
        report_file: None,
        logging: None,
    };
    let landscape = Landscape::hex_grid(40, 40, 3.0).unwrap();
    build_context(&config, fox_parameters(), landscape).unwrap()
}

pub fn criterion_benchmark(criterion: &mut Criterion) {
    let mut criterion = criterion.benchmark_group("weekly_step");

    // Week 16 carries the birth pulse, week 40 the autumn dispersal.
    for week in [10, 16, 40] {
        criterion.bench_function(format!("step_week_{week}"), |bencher| {
            bencher.iter_batched(
                || setup(week),
                |mut context| black_box(context.step_week().unwrap()),
                BatchSize::LargeInput,
            );
        });
    }

    criterion.bench_function("run_one_year", |bencher| {
        bencher.iter_batched(
            || setup(1),
            |mut context| black_box(context.run_weeks(52).unwrap().len()),
            BatchSize::LargeInput,
        );
    });

    criterion.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
