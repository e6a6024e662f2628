use rabies_abm::species::{DensityDependence, ReproductionPulse, SexAgeTables, SpeciesParameterValues};
use rabies_abm::SpeciesParameters;

const WEEKS: usize = 52;

pub fn raccoon_values() -> SpeciesParameterValues {
    let mut young_weeks = vec![false; WEEKS];
    for week in 30..=45 {
        young_weeks[week - 1] = true;
    }
    let adult_weeks = vec![true; WEEKS];
    let mut distance = vec![0.0; 50];
    distance[1] = 0.5;
    distance[2] = 0.5;
    let mut adult_distance = vec![0.0; 50];
    adult_distance[1] = 1.0;

    SpeciesParameterValues {
        name: "raccoon".to_string(),
        male_mortality: vec![0.5, 0.4, 0.4, 0.5, 0.6, 0.7, 0.8, 1.0],
        female_mortality: vec![0.5, 0.35, 0.4, 0.5, 0.6, 0.7, 0.8, 1.0],
        male_home_range: vec![0.3; WEEKS],
        female_home_range: vec![0.2; WEEKS],
        movement_weeks: SexAgeTables {
            male_young_of_year: young_weeks.clone(),
            male_juvenile_adult: adult_weeks.clone(),
            female_young_of_year: young_weeks,
            female_juvenile_adult: adult_weeks,
        },
        movement_distance: SexAgeTables {
            male_young_of_year: distance.clone(),
            male_juvenile_adult: adult_distance.clone(),
            female_young_of_year: distance,
            female_juvenile_adult: adult_distance,
        },
        litter_size_mean: 3.5,
        litter_size_variance: 1.0,
        max_litter_size: 7,
        litter_size_table: None,
        male_percent: 50.0,
        juvenile_birth_odds: 50.0,
        adult_birth_odds: 85.0,
        independence_age: 34,
        adult_age: 104,
        reproduction_pulses: vec![ReproductionPulse {
            mean_week: 18.0,
            variance: 3.0,
        }],
        gestation_period: 9,
        density: DensityDependence::default(),
        max_age: 415,
    }
}

pub fn raccoon_parameters() -> SpeciesParameters {
    SpeciesParameters::new(raccoon_values()).unwrap()
}
