//! Mathboard browser smoke-test harness
//!
//! A Rust-controlled harness that:
//! - Spawns the mathboard-server binary (or attaches to a running app)
//! - Drives the UI through Playwright via a generated Node.js script
//! - Parses declarative YAML scenarios, including the built-in smoke flow
//! - Compares captured screenshots against baselines
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Runner (Rust)                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Runner                                                      │
//! │    ├── AppHandle::start()        spawn or attach + health    │
//! │    ├── PlaywrightDriver          one node script / scenario  │
//! │    │     └── PWEVT events        per-step progress on stdout │
//! │    ├── VisualTester              baseline screenshot diffs   │
//! │    └── SuiteReport               pretty JSON per run         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                             │
//! │    ├── name, tags, viewport                                  │
//! │    └── steps: navigate / click / fill / press / wait_for /   │
//! │              sleep / expect_text / screenshot                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole scenario runs in ONE browser session; the generated script's
//! catch block captures an error screenshot and its finally block closes
//! the browser, pass or fail.

pub mod error;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod server;
pub mod smoke;
pub mod visual;

pub use error::{E2eError, E2eResult};
pub use runner::Runner;
pub use scenario::{Scenario, Step};
