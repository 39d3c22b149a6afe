//! The built-in verification flow: create a profile, answer part of a quiz
//! question, open the stats view, and capture screenshots along the way.
//!
//! The same flow ships as `specs/smoke.yaml`; a test asserts the two stay
//! in sync.

use crate::scenario::{Scenario, Step, Viewport, WaitState};

/// Profile name used when none is given
pub const DEFAULT_PROFILE: &str = "SmokeTest";

/// Build the smoke scenario for a given profile name
pub fn smoke_scenario(profile_name: &str) -> Scenario {
    Scenario {
        name: "smoke".to_string(),
        description: "Create a profile, answer on the quiz numpad, open the stats view"
            .to_string(),
        tags: vec!["smoke".to_string()],
        viewport: Viewport {
            width: 1280,
            height: 720,
        },
        steps: vec![
            Step::Navigate {
                url: "/".to_string(),
                wait_for_selector: None,
            },
            Step::Click {
                selector: r#"button:has-text("New Profile")"#.to_string(),
                timeout_ms: None,
            },
            Step::Fill {
                selector: r#"input[type="text"]"#.to_string(),
                value: profile_name.to_string(),
            },
            Step::Click {
                selector: r#"button:has-text("Save")"#.to_string(),
                timeout_ms: None,
            },
            Step::Click {
                selector: format!(r#"button:has-text("{}")"#, profile_name),
                timeout_ms: None,
            },
            // The large numeric prompt marks the quiz page
            Step::WaitFor {
                selector: ".text-8xl".to_string(),
                state: WaitState::Visible,
                timeout_ms: 5000,
            },
            Step::Click {
                selector: r#"button:has-text("1")"#.to_string(),
                timeout_ms: None,
            },
            Step::Click {
                selector: r#"button:has-text("2")"#.to_string(),
                timeout_ms: None,
            },
            Step::Screenshot {
                name: "quiz".to_string(),
                full_page: false,
            },
            Step::Click {
                selector: ".lucide-bar-chart-2".to_string(),
                timeout_ms: None,
            },
            // The stats view populates after a network fetch
            Step::Sleep { ms: 1000 },
            Step::Screenshot {
                name: "stats".to_string(),
                full_page: false,
            },
        ],
        visual_regression: true,
        visual_threshold: 0.5,
    }
}
