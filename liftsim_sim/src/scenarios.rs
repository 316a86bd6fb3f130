//! Fleet scenarios for deterministic simulation.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// LS-001: one request, the closest idle elevator must take it
    NearestIdle,

    /// LS-002: every elevator busy, requests go to the shortest target list
    Saturation,

    /// LS-003: generator load against the whole fleet
    RushHour,

    /// LS-004: elevators pulled out of service mid-run, then restored
    Maintenance,

    /// LS-005: a snapshot with a target outside the building
    MisconfiguredBounds,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::NearestIdle,
            ScenarioId::Saturation,
            ScenarioId::RushHour,
            ScenarioId::Maintenance,
            ScenarioId::MisconfiguredBounds,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::NearestIdle => "nearest_idle",
            ScenarioId::Saturation => "saturation",
            ScenarioId::RushHour => "rush_hour",
            ScenarioId::Maintenance => "maintenance",
            ScenarioId::MisconfiguredBounds => "misconfigured_bounds",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::NearestIdle => "Idle elevators at 0 and 10, request 9->12 goes to the one at 10",
            ScenarioId::Saturation => "All elevators moving, assignments balance by target count",
            ScenarioId::RushHour => "Synthetic batches every interval, queue must drain",
            ScenarioId::Maintenance => "Out-of-service elevators freeze, log once, and resume",
            ScenarioId::MisconfiguredBounds => "Movement past the top floor forces Error",
        }
    }

    /// Returns true if the scenario uses the request generator.
    pub fn uses_generator(&self) -> bool {
        matches!(self, ScenarioId::RushHour)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest_idle" | "nearestidle" | "ls-001" => Ok(ScenarioId::NearestIdle),
            "saturation" | "ls-002" => Ok(ScenarioId::Saturation),
            "rush_hour" | "rushhour" | "ls-003" => Ok(ScenarioId::RushHour),
            "maintenance" | "ls-004" => Ok(ScenarioId::Maintenance),
            "misconfigured_bounds" | "misconfiguredbounds" | "ls-005" => Ok(ScenarioId::MisconfiguredBounds),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
