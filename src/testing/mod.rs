//! Scenario testing for deterministic possession and control checks
//!
//! Scenarios are TOML files: a setup (actors, balls, active actor), scripted
//! input per frame, and expected event sequences and state. They run against a
//! headless app, one `FixedUpdate` step per frame.

pub mod assertions;
pub mod discovery;
pub mod input;
pub mod parser;
pub mod runner;

pub use assertions::{AssertionError, CapturedEvent, check_sequence, check_state};
pub use discovery::{ScenarioOutcome, Summary, discover_scenarios, run_file, run_scenarios};
pub use input::ScriptedInputs;
pub use parser::{
    EntityDef, ExpectedEvent, FrameInput, StateAssertion, TestDefinition, TestExpectations,
    TestSetup, parse_test_file,
};
pub use runner::{TestResult, run_test};

/// Default path for scenarios
pub const SCENARIOS_DIR: &str = "tests/scenarios";
