//! Playwright browser automation
//!
//! The harness does not link a browser library; it generates a Node.js
//! script from the scenario steps and runs it with `node`, the same way a
//! hand-written Playwright script would be run. The whole scenario executes
//! in ONE browser/context/page so state (a created profile, an in-progress
//! quiz) survives across steps. The script reports progress on stdout as
//! `PWEVT {json}` lines which the Rust side parses back into step results.

use std::path::PathBuf;
use std::process::Stdio;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::process::Command as TokioCommand;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};
use crate::scenario::{Scenario, Step, WaitState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

/// Configuration for the driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Base URL of the app under test
    pub base_url: String,

    /// Browser engine
    pub browser: BrowserKind,

    /// Run without a visible window
    pub headless: bool,

    /// Default per-action timeout applied to the page
    pub action_timeout_ms: u64,

    /// Directory where screenshots land
    pub screenshot_dir: PathBuf,

    /// File stem for the screenshot taken when a step fails
    pub error_screenshot: String,

    /// Directory whose node_modules provides the `playwright` package
    pub node_root: PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            browser: BrowserKind::Chromium,
            headless: true,
            action_timeout_ms: 15_000,
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            error_screenshot: "error".to_string(),
            node_root: PathBuf::from("."),
        }
    }
}

/// One completed step, as reported by the generated script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub name: String,
    pub duration_ms: u64,
}

/// Terminal failure of a scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailure {
    /// Index of the step that threw
    pub index: usize,
    pub error: String,
    /// Best-effort screenshot of the page at the moment of failure
    pub error_screenshot: Option<PathBuf>,
}

/// Result of executing a scenario in the browser
#[derive(Debug, Clone)]
pub struct ScenarioRun {
    pub steps: Vec<StepOutcome>,
    pub failure: Option<RunFailure>,
    /// Stems of screenshots captured by Screenshot steps that completed
    pub screenshots: Vec<String>,
}

impl ScenarioRun {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Progress events emitted by the generated script
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DriverEvent {
    Step { index: usize, name: String, ms: u64 },
    Done,
    Failed { index: usize, error: String },
}

/// Playwright driver: generates and runs one script per scenario
pub struct PlaywrightDriver {
    config: DriverConfig,
    /// Absolute screenshot dir; the script runs from a temp dir, so relative
    /// paths would land there.
    screenshot_dir: PathBuf,
}

/// Embed a Rust string into generated JS as a double-quoted literal
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl PlaywrightDriver {
    pub fn new(config: DriverConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.screenshot_dir)?;
        let screenshot_dir = config.screenshot_dir.canonicalize()?;

        Ok(Self {
            config,
            screenshot_dir,
        })
    }

    /// Verify `node` can resolve the playwright package
    pub fn check_playwright(&self) -> E2eResult<()> {
        let status = std::process::Command::new("node")
            .args(["-e", "require.resolve('playwright')"])
            .env("NODE_PATH", self.config.node_root.join("node_modules"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(s) if s.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound {
                node_root: self.config.node_root.display().to_string(),
            }),
        }
    }

    /// Generate the Node.js script for a scenario
    pub fn build_script(&self, scenario: &Scenario) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ chromium, firefox, webkit }} = require('playwright');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  const baseUrl = {base_url};
  const evt = (e) => console.log('PWEVT ' + JSON.stringify(e));
  let step = 0;

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = scenario.viewport.width,
            height = scenario.viewport.height,
            timeout = self.config.action_timeout_ms,
            base_url = js_str(&self.config.base_url),
        ));

        for (i, step) in scenario.steps.iter().enumerate() {
            let name = step.display_name();
            script.push_str(&format!("\n    // step {}: {}\n", i, name));
            script.push_str(&format!("    step = {};\n", i));
            script.push_str("    {\n      const t0 = Date.now();\n");
            script.push_str(&self.step_to_js(step));
            script.push_str(&format!(
                "      evt({{ kind: 'step', index: {}, name: {}, ms: Date.now() - t0 }});\n    }}\n",
                i,
                js_str(&name),
            ));
        }

        let error_path = self
            .screenshot_dir
            .join(format!("{}.png", self.config.error_screenshot));

        script.push_str(&format!(
            r#"
    evt({{ kind: 'done' }});
  }} catch (error) {{
    try {{ await page.screenshot({{ path: {error_path} }}); }} catch (_) {{}}
    evt({{ kind: 'failed', index: step, error: String((error && error.message) || error) }});
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#,
            error_path = js_str(&error_path.to_string_lossy()),
        ));

        script
    }

    fn step_to_js(&self, step: &Step) -> String {
        match step {
            Step::Navigate {
                url,
                wait_for_selector,
            } => {
                let mut js = format!("      await page.goto(baseUrl + {});\n", js_str(url));
                if let Some(sel) = wait_for_selector {
                    js.push_str(&format!(
                        "      await page.waitForSelector({});\n",
                        js_str(sel)
                    ));
                }
                js
            }
            Step::Click {
                selector,
                timeout_ms,
            } => match timeout_ms {
                Some(t) => format!(
                    "      await page.click({}, {{ timeout: {} }});\n",
                    js_str(selector),
                    t
                ),
                None => format!("      await page.click({});\n", js_str(selector)),
            },
            Step::Fill { selector, value } => format!(
                "      await page.fill({}, {});\n",
                js_str(selector),
                js_str(value)
            ),
            Step::Press { selector, key } => match selector {
                Some(sel) => format!(
                    "      await page.locator({}).press({});\n",
                    js_str(sel),
                    js_str(key)
                ),
                None => format!("      await page.keyboard.press({});\n", js_str(key)),
            },
            Step::WaitFor {
                selector,
                state,
                timeout_ms,
            } => {
                let state_str = match state {
                    WaitState::Visible => "visible",
                    WaitState::Hidden => "hidden",
                    WaitState::Attached => "attached",
                    WaitState::Detached => "detached",
                };
                format!(
                    "      await page.waitForSelector({}, {{ state: '{}', timeout: {} }});\n",
                    js_str(selector),
                    state_str,
                    timeout_ms
                )
            }
            Step::Sleep { ms } => format!("      await page.waitForTimeout({});\n", ms),
            Step::ExpectText { selector, contains } => format!(
                "      const text = await page.innerText({sel});\n      if (!text.includes({needle})) {{\n        throw new Error('text of ' + {sel} + ' does not contain ' + {needle});\n      }}\n",
                sel = js_str(selector),
                needle = js_str(contains),
            ),
            Step::Screenshot { name, full_page } => {
                let path = self.screenshot_dir.join(format!("{}.png", name));
                format!(
                    "      await page.screenshot({{ path: {}, fullPage: {} }});\n",
                    js_str(&path.to_string_lossy()),
                    full_page
                )
            }
        }
    }

    /// Run a scenario: generate the script, execute it with node, and parse
    /// the PWEVT progress lines back into step outcomes.
    pub async fn run_scenario(&self, scenario: &Scenario) -> E2eResult<ScenarioRun> {
        self.check_playwright()?;

        let script = self.build_script(scenario);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, &script)?;

        debug!("Running scenario '{}' via {}", scenario.name, script_path.display());

        let output = TokioCommand::new("node")
            .arg(&script_path)
            .env("NODE_PATH", self.config.node_root.join("node_modules"))
            .current_dir(temp_dir.path())
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let events = parse_events(&stdout)?;

        let mut steps = Vec::new();
        let mut screenshots = Vec::new();
        let mut failure = None;
        let mut terminated = false;

        for event in events {
            match event {
                DriverEvent::Step { index, name, ms } => {
                    if let Some(Step::Screenshot { name, .. }) = scenario.steps.get(index) {
                        screenshots.push(name.clone());
                    }
                    steps.push(StepOutcome {
                        index,
                        name,
                        duration_ms: ms,
                    });
                }
                DriverEvent::Done => {
                    terminated = true;
                }
                DriverEvent::Failed { index, error } => {
                    let error_path = self
                        .screenshot_dir
                        .join(format!("{}.png", self.config.error_screenshot));
                    failure = Some(RunFailure {
                        index,
                        error,
                        error_screenshot: error_path.exists().then_some(error_path),
                    });
                    terminated = true;
                }
            }
        }

        if !terminated {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Driver(format!(
                "script ended without a result (exit: {:?})\nstdout: {}\nstderr: {}",
                output.status.code(),
                stdout,
                stderr
            )));
        }

        if let Some(f) = &failure {
            warn!(
                "Scenario '{}' failed at step {}: {}",
                scenario.name, f.index, f.error
            );
        }

        Ok(ScenarioRun {
            steps,
            failure,
            screenshots,
        })
    }
}

fn parse_events(stdout: &str) -> E2eResult<Vec<DriverEvent>> {
    let re = Regex::new(r"^PWEVT (\{.*\})$").map_err(|e| E2eError::Driver(e.to_string()))?;

    let mut events = Vec::new();
    for line in stdout.lines() {
        if let Some(caps) = re.captures(line.trim_end()) {
            let event: DriverEvent = serde_json::from_str(&caps[1])?;
            events.push(event);
        }
    }
    Ok(events)
}
