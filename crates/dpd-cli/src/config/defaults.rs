/// Values used when neither the scenario file nor the command line sets them.
pub struct DefaultsConfig {
    pub timestep: f64,
    pub steps: u64,
    pub first_step: u64,
    pub rank: usize,
    pub log_rank: usize,
    pub sample_period: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            timestep: 0.01,
            steps: 1000,
            first_step: 1,
            rank: 0,
            log_rank: 0,
            sample_period: 100,
        }
    }
}
