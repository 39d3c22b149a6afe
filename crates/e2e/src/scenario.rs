//! Declarative YAML scenario model

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::E2eResult;

/// A complete browser scenario parsed from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Steps to execute in order, in one browser session
    pub steps: Vec<Step>,

    /// Whether captured screenshots are compared against baselines
    #[serde(default)]
    pub visual_regression: bool,

    /// Threshold for visual diff (0.0 - 100.0 percent)
    #[serde(default = "default_threshold")]
    pub visual_threshold: f64,
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}

fn default_threshold() -> f64 {
    0.5 // 0.5% pixel difference allowed by default
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A single step in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to a URL (relative to base)
    Navigate {
        url: String,
        #[serde(default)]
        wait_for_selector: Option<String>,
    },

    /// Click an element
    Click {
        selector: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Fill an input field
    Fill { selector: String, value: String },

    /// Press a key, optionally scoped to an element
    Press {
        #[serde(default)]
        selector: Option<String>,
        key: String,
    },

    /// Wait for an element to reach a state
    WaitFor {
        selector: String,
        #[serde(default)]
        state: WaitState,
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
    },

    /// Wait for a fixed amount of time (use sparingly; some views only
    /// settle after an async fetch)
    Sleep { ms: u64 },

    /// Assert an element's text contains a substring
    ExpectText { selector: String, contains: String },

    /// Take a screenshot
    Screenshot {
        name: String,
        #[serde(default)]
        full_page: bool,
    },
}

fn default_wait_timeout() -> u64 {
    5000 // 5 seconds default
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl Step {
    /// Short display name, used in logs and step reports
    pub fn display_name(&self) -> String {
        match self {
            Step::Navigate { url, .. } => format!("navigate:{}", url),
            Step::Click { selector, .. } => format!("click:{}", selector),
            Step::Fill { selector, .. } => format!("fill:{}", selector),
            Step::Press { key, .. } => format!("press:{}", key),
            Step::WaitFor { selector, .. } => format!("wait_for:{}", selector),
            Step::Sleep { ms } => format!("sleep:{}ms", ms),
            Step::ExpectText { selector, .. } => format!("expect_text:{}", selector),
            Step::Screenshot { name, .. } => format!("screenshot:{}", name),
        }
    }
}

impl Scenario {
    /// Parse a scenario from YAML
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all scenarios under a directory
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            scenarios.push(Self::from_file(entry.path())?);
        }

        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag(scenarios: Vec<Self>, tag: &str) -> Vec<Self> {
        scenarios
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_scenario() {
        let yaml = r#"
name: profile-create
description: Create a profile from the home screen
tags:
  - smoke
steps:
  - action: navigate
    url: /
  - action: click
    selector: 'button:has-text("New Profile")'
  - action: fill
    selector: 'input[type="text"]'
    value: Tester
  - action: screenshot
    name: profile-form
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "profile-create");
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(scenario.viewport.width, 1280);
        assert_eq!(scenario.visual_threshold, 0.5);
    }

    #[test]
    fn test_parse_wait_states() {
        let yaml = r#"
name: waits
steps:
  - action: wait_for
    selector: .text-8xl
  - action: wait_for
    selector: .spinner
    state: hidden
    timeout_ms: 10000
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(
            scenario.steps[0],
            Step::WaitFor {
                selector: ".text-8xl".to_string(),
                state: WaitState::Visible,
                timeout_ms: 5000,
            }
        );
        assert_eq!(
            scenario.steps[1],
            Step::WaitFor {
                selector: ".spinner".to_string(),
                state: WaitState::Hidden,
                timeout_ms: 10000,
            }
        );
    }

    #[test]
    fn test_parse_visual_regression_scenario() {
        let yaml = r#"
name: stats-visual
visual_regression: true
visual_threshold: 1.0
viewport:
  width: 1920
  height: 1080
steps:
  - action: navigate
    url: /
  - action: screenshot
    name: stats-full
    full_page: true
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert!(scenario.visual_regression);
        assert_eq!(scenario.visual_threshold, 1.0);
        assert_eq!(scenario.viewport.width, 1920);
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        let yaml = r#"
name: bad
steps:
  - action: teleport
    url: /
"#;
        assert!(Scenario::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_filter_by_tag() {
        let yaml_a = "name: a\ntags: [smoke]\nsteps: []\n";
        let yaml_b = "name: b\ntags: [visual]\nsteps: []\n";
        let scenarios = vec![
            Scenario::from_yaml(yaml_a).unwrap(),
            Scenario::from_yaml(yaml_b).unwrap(),
        ];

        let smoke = Scenario::filter_by_tag(scenarios, "smoke");
        assert_eq!(smoke.len(), 1);
        assert_eq!(smoke[0].name, "a");
    }
}
