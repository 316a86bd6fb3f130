//! Fleet configuration.
//!
//! Values mirror the environment-level settings consumed at startup
//! (`SIMULATION_INTERVAL_MS`, `TIME_PER_FLOOR_MS`, ...). The CLI fills them
//! in; library users start from [`FleetConfig::default`].

use crate::error::FleetError;
use std::time::Duration;

/// Configuration for the synthetic request generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Delay before the first batch (default: 5s)
    pub startup_delay: Duration,

    /// Interval between batches (default: 5s)
    pub interval: Duration,

    /// Largest batch size; each batch holds 1..=max_batch requests (default: 3)
    pub max_batch: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_millis(5000),
            interval: Duration::from_millis(5000),
            max_batch: 3,
        }
    }
}

/// Configuration for a fleet.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Simulation clock period (default: 1s)
    pub tick_interval: Duration,

    /// Dispatch cycle period (default: 2s)
    pub dispatch_interval: Duration,

    /// Travel time between adjacent floors (default: 3s)
    pub time_per_floor: Duration,

    /// Door hold time (default: 5s)
    pub time_door_open: Duration,

    /// Lowest floor (default: -3)
    pub min_floor: i32,

    /// Highest floor (default: 50)
    pub max_floor: i32,

    /// Floor new elevators start on (default: 1)
    pub default_floor: i32,

    /// Capacity used when the caller does not pick one (default: 10)
    pub default_capacity: u32,

    /// Synthetic load settings
    pub generator: GeneratorConfig,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1000),
            dispatch_interval: Duration::from_millis(2000),
            time_per_floor: Duration::from_millis(3000),
            time_door_open: Duration::from_millis(5000),
            min_floor: -3,
            max_floor: 50,
            default_floor: 1,
            default_capacity: 10,
            generator: GeneratorConfig::default(),
        }
    }
}

impl FleetConfig {
    /// Sets the floor bounds.
    pub fn with_floors(mut self, min_floor: i32, max_floor: i32) -> Self {
        self.min_floor = min_floor;
        self.max_floor = max_floor;
        self
    }

    /// Sets the per-floor travel time and door hold time.
    pub fn with_timing(mut self, time_per_floor: Duration, time_door_open: Duration) -> Self {
        self.time_per_floor = time_per_floor;
        self.time_door_open = time_door_open;
        self
    }

    /// Sets the starting floor for new elevators.
    pub fn with_default_floor(mut self, floor: i32) -> Self {
        self.default_floor = floor;
        self
    }

    /// Returns true if `floor` lies within the building.
    pub fn contains_floor(&self, floor: i32) -> bool {
        (self.min_floor..=self.max_floor).contains(&floor)
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), FleetError> {
        if self.min_floor >= self.max_floor {
            return Err(FleetError::config(format!(
                "min_floor ({}) must be below max_floor ({})",
                self.min_floor, self.max_floor
            )));
        }
        if !self.contains_floor(self.default_floor) {
            return Err(FleetError::config(format!(
                "default_floor {} outside [{}, {}]",
                self.default_floor, self.min_floor, self.max_floor
            )));
        }
        if self.default_capacity == 0 {
            return Err(FleetError::config("default_capacity must be at least 1"));
        }
        let periods = [
            ("tick_interval", self.tick_interval),
            ("dispatch_interval", self.dispatch_interval),
            ("generator.interval", self.generator.interval),
            ("time_per_floor", self.time_per_floor),
            ("time_door_open", self.time_door_open),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                return Err(FleetError::config(format!("{name} must be non-zero")));
            }
        }
        if self.generator.max_batch == 0 {
            return Err(FleetError::config("generator.max_batch must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_config_default() {
        let config = FleetConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.time_per_floor, Duration::from_secs(3));
        assert_eq!(config.time_door_open, Duration::from_secs(5));
        assert_eq!((config.min_floor, config.max_floor), (-3, 50));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = FleetConfig::default().with_floors(10, 10);
        assert!(matches!(config.validate(), Err(FleetError::InvalidConfig(_))));
    }

    #[test]
    fn test_default_floor_must_be_inside() {
        let config = FleetConfig::default().with_floors(2, 9);
        assert!(config.validate().is_err());
        assert!(config.with_default_floor(2).validate().is_ok());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let config = FleetConfig {
            tick_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_travel_timing_rejected() {
        let config = FleetConfig::default().with_timing(Duration::ZERO, Duration::ZERO);
        assert!(matches!(config.validate(), Err(FleetError::InvalidConfig(_))));

        let config = FleetConfig::default().with_timing(Duration::from_secs(3), Duration::ZERO);
        assert!(matches!(config.validate(), Err(FleetError::InvalidConfig(_))));
    }
}
