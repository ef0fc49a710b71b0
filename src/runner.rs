//! Assertion runner: applies each scenario's setup before every check and
//! collects one outcome per check.

use crate::fixture::FixtureStore;
use crate::scenarios::{Scenario, Setup};
use crate::session::PageSession;
use crate::{HarnessConfig, Result};
use log::{error, info, warn};
use serde::Serialize;
use std::time::Instant;

/// Result of one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub scenario: String,
    pub check: String,
    pub passed: bool,
    /// Failure message, `None` when the check passed
    pub error: Option<String>,
    /// The check could not run to its assertion (missing element, load or
    /// fixture error) rather than observing a wrong value
    pub fault: bool,
    pub duration_ms: u64,
}

/// Outcomes of a run, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub outcomes: Vec<CheckOutcome>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    /// Outcome of the named check, if it ran.
    pub fn outcome(&self, check: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.check == check)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Runs scenarios against a page session.
pub struct Runner {
    fixtures: FixtureStore,
}

impl Runner {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            fixtures: FixtureStore::new(config.fixtures_dir.clone()),
        }
    }

    pub fn with_fixtures(fixtures: FixtureStore) -> Self {
        Self { fixtures }
    }

    /// Run every check of every scenario. A failing check never stops the run.
    pub fn run(&self, session: &mut dyn PageSession, scenarios: &[Scenario]) -> Report {
        let mut report = Report::default();
        for scenario in scenarios {
            info!("scenario: {}", scenario.name);
            for check in &scenario.checks {
                let started = Instant::now();
                let result = prepare(session, &scenario.setup)
                    .and_then(|_| (check.run)(session, &self.fixtures));
                let duration_ms = started.elapsed().as_millis() as u64;

                let (error, fault) = match result {
                    Ok(()) => {
                        info!("  ok   {} ({}ms)", check.name, duration_ms);
                        (None, false)
                    }
                    Err(e) if e.is_assertion() => {
                        warn!("  FAIL {}: {}", check.name, e);
                        (Some(e.to_string()), false)
                    }
                    Err(e) => {
                        error!("  ERROR {}: {}", check.name, e);
                        (Some(e.to_string()), true)
                    }
                };

                report.outcomes.push(CheckOutcome {
                    scenario: scenario.name.to_string(),
                    check: check.name.to_string(),
                    passed: error.is_none(),
                    error,
                    fault,
                    duration_ms,
                });
            }
        }
        report
    }
}

/// Bring the page to the scenario's known initial state.
pub fn prepare(session: &mut dyn PageSession, setup: &Setup) -> Result<()> {
    session.set_viewport(setup.viewport)?;
    session.visit("/")?;
    if setup.reload {
        session.reload()?;
    }
    Ok(())
}
