pub mod census;
pub mod normalize;
pub mod overrides;
pub mod pollution_join;
pub mod population_join;
pub mod postal;
pub mod reshape;

pub use census::enrich_with_census;
pub use normalize::normalize_headers;
pub use overrides::apply_overrides;
pub use pollution_join::join_pollution_population;
pub use population_join::PopulationJoiner;
pub use postal::fix_postal_code;
pub use reshape::PollutantReshaper;
