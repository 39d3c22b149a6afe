//! Orchestration: app server up, scenarios through the driver, screenshots
//! through the visual tester, everything into a suite report

use std::path::{Path, PathBuf};
use std::time::Instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{E2eError, E2eResult};
use crate::playwright::{DriverConfig, PlaywrightDriver, StepOutcome};
use crate::scenario::Scenario;
use crate::server::{AppHandle, Target};
use crate::smoke;
use crate::visual::{VisualConfig, VisualTester};

/// Report for one screenshot comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualReport {
    pub name: String,
    pub matches: bool,
    pub diff_percent: f64,
    pub diff_image_path: Option<String>,
}

/// Report for one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepOutcome>,
    pub failed_step: Option<usize>,
    pub error: Option<String>,
    pub error_screenshot: Option<String>,
    pub visual: Vec<VisualReport>,
}

/// Aggregated report for a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub scenarios: Vec<ScenarioReport>,
}

/// Configuration for the runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub target: Target,
    pub driver: DriverConfig,
    pub visual: VisualConfig,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target: Target::Spawn(Default::default()),
            driver: DriverConfig::default(),
            visual: VisualConfig::default(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Smoke-test runner
pub struct Runner {
    config: RunnerConfig,
    app: Option<AppHandle>,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config, app: None }
    }

    /// Bring the app up (or verify the attached one) and point the driver
    /// at it
    pub async fn ensure_app(&mut self) -> E2eResult<()> {
        if self.app.is_none() {
            let app = AppHandle::start(&self.config.target).await?;
            self.config.driver.base_url = app.base_url().to_string();
            self.app = Some(app);
        }
        Ok(())
    }

    /// Stop the app if we spawned it
    pub fn stop_app(&mut self) {
        if let Some(mut app) = self.app.take() {
            app.stop();
        }
    }

    /// Run one scenario end to end
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> E2eResult<ScenarioReport> {
        self.ensure_app().await?;

        let start = Instant::now();
        let driver = PlaywrightDriver::new(self.config.driver.clone())?;
        let run = driver.run_scenario(scenario).await?;

        let mut error = None;
        let mut failed_step = None;
        let mut error_screenshot = None;

        if let Some(failure) = &run.failure {
            failed_step = Some(failure.index);
            error = Some(failure.error.clone());
            error_screenshot = failure
                .error_screenshot
                .as_ref()
                .map(|p| p.to_string_lossy().to_string());
        }

        // Screenshots feed the baseline comparison only when the flow
        // itself made it through
        let mut visual = Vec::new();
        if scenario.visual_regression && run.success() {
            let tester = VisualTester::new(self.config.visual.clone())?;

            for name in &run.screenshots {
                match tester.compare(name, Some(scenario.visual_threshold)) {
                    Ok(diff) => {
                        if !diff.matches && error.is_none() {
                            error = Some(format!(
                                "Visual regression in '{}': {:.2}% pixels differ",
                                name, diff.diff_percent
                            ));
                        }
                        visual.push(VisualReport {
                            name: name.clone(),
                            matches: diff.matches,
                            diff_percent: diff.diff_percent,
                            diff_image_path: diff
                                .diff_image_path
                                .map(|p| p.to_string_lossy().to_string()),
                        });
                    }
                    Err(E2eError::BaselineNotFound(_)) => {
                        info!(
                            "No baseline for '{}' - rerun with --update-baselines to adopt it",
                            name
                        );
                    }
                    Err(e) => {
                        if error.is_none() {
                            error = Some(format!("Visual comparison error: {}", e));
                        }
                    }
                }
            }
        }

        Ok(ScenarioReport {
            name: scenario.name.clone(),
            passed: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps: run.steps,
            failed_step,
            error,
            error_screenshot,
            visual,
        })
    }

    /// Run a list of scenarios; each gets a fresh browser session
    pub async fn run_scenarios(&mut self, scenarios: &[Scenario]) -> E2eResult<SuiteReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        self.ensure_app().await?;

        info!("Running {} scenario(s)...", scenarios.len());

        let mut reports = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        for scenario in scenarios {
            match self.run_scenario(scenario).await {
                Ok(report) => {
                    if report.passed {
                        passed += 1;
                        info!("PASS {} ({} ms)", report.name, report.duration_ms);
                    } else {
                        failed += 1;
                        error!(
                            "FAIL {} - {}",
                            report.name,
                            report.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                    reports.push(report);
                }
                Err(e) => {
                    failed += 1;
                    error!("FAIL {} - {}", scenario.name, e);
                    reports.push(ScenarioReport {
                        name: scenario.name.clone(),
                        passed: false,
                        duration_ms: 0,
                        steps: vec![],
                        failed_step: None,
                        error: Some(e.to_string()),
                        error_screenshot: None,
                        visual: vec![],
                    });
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteReport {
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            scenarios: reports,
        })
    }

    /// Run every YAML scenario under a directory, optionally filtered by tag
    pub async fn run_dir(&mut self, dir: &Path, tag: Option<&str>) -> E2eResult<SuiteReport> {
        let mut scenarios = Scenario::load_all(dir)?;
        if let Some(tag) = tag {
            scenarios = Scenario::filter_by_tag(scenarios, tag);
        }
        self.run_scenarios(&scenarios).await
    }

    /// Run the built-in smoke flow
    pub async fn run_smoke(&mut self, profile_name: &str) -> E2eResult<SuiteReport> {
        let scenario = smoke::smoke_scenario(profile_name);
        self.run_scenarios(std::slice::from_ref(&scenario)).await
    }

    /// Copy current screenshots over their baselines
    pub fn update_baselines(&self) -> E2eResult<()> {
        let tester = VisualTester::new(self.config.visual.clone())?;

        for entry in std::fs::read_dir(&self.config.visual.actual_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    tester.update_baseline(&name.to_string_lossy())?;
                }
            }
        }

        Ok(())
    }

    /// Write the suite report as pretty JSON into the output directory
    pub fn write_report(&self, report: &SuiteReport) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("suite-report.json");
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&path, json)?;

        info!("Report written to {}", path.display());
        Ok(path)
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop_app();
    }
}
