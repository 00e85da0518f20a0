use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },
}

/// Parameters of one simulation run on one rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Integration timestep.
    pub timestep: f64,
    /// Number of steps to integrate; steps are numbered `1..=total_steps`.
    pub total_steps: u64,
    /// Rank of this process.
    pub rank: usize,
    /// The one rank whose events reach the event callback.
    pub log_rank: usize,
    /// How often, in steps, the driver reports progress.
    pub sample_period: u64,
}

impl RunConfig {
    pub fn is_logging_rank(&self) -> bool {
        self.rank == self.log_rank
    }
}

#[derive(Default)]
pub struct RunConfigBuilder {
    timestep: Option<f64>,
    total_steps: Option<u64>,
    rank: Option<usize>,
    log_rank: Option<usize>,
    sample_period: Option<u64>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestep(mut self, dt: f64) -> Self {
        self.timestep = Some(dt);
        self
    }
    pub fn total_steps(mut self, steps: u64) -> Self {
        self.total_steps = Some(steps);
        self
    }
    pub fn rank(mut self, rank: usize) -> Self {
        self.rank = Some(rank);
        self
    }
    pub fn log_rank(mut self, rank: usize) -> Self {
        self.log_rank = Some(rank);
        self
    }
    pub fn sample_period(mut self, period: u64) -> Self {
        self.sample_period = Some(period);
        self
    }

    /// Builds the configuration. `rank` and `log_rank` default to 0 and
    /// `sample_period` to 1.
    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let timestep = self
            .timestep
            .ok_or(ConfigError::MissingParameter("timestep"))?;
        if !(timestep.is_finite() && timestep > 0.0) {
            return Err(ConfigError::InvalidValue {
                parameter: "timestep",
                reason: format!("{timestep} is not a positive finite number"),
            });
        }
        let sample_period = self.sample_period.unwrap_or(1);
        if sample_period == 0 {
            return Err(ConfigError::InvalidValue {
                parameter: "sample_period",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(RunConfig {
            timestep,
            total_steps: self
                .total_steps
                .ok_or(ConfigError::MissingParameter("total_steps"))?,
            rank: self.rank.unwrap_or(0),
            log_rank: self.log_rank.unwrap_or(0),
            sample_period,
        })
    }
}
