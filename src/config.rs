//! Session and analysis configuration
//!
//! Configuration is read from an optional TOML file. Every field has a
//! default, so an absent file (or an empty one) yields the historical fixed
//! setup: four self-rated variables, three interventions and the arithmetic,
//! n-back and Stroop tests at one minute each.

use crate::error::CogError;
use crate::types::{Color, Operation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cogtest.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub analysis: AnalysisConfig,
    pub tracker: TrackerConfig,
    pub logging: LoggingConfig,
}

/// What a live session asks and runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory receiving one log file per session
    pub log_dir: PathBuf,
    /// Wall-clock duration of each test
    pub test_duration_secs: u64,
    /// Pause after an intervention that needs time to take effect
    pub wait_period_secs: u64,
    pub variables: Vec<VariableSpec>,
    pub interventions: Vec<InterventionSpec>,
    pub tests: Vec<TestSpec>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            test_duration_secs: 60,
            wait_period_secs: 5 * 60,
            variables: [
                "energy level",
                "comfortableness",
                "everything-makes-sense-ness",
                "bodyload",
            ]
            .into_iter()
            .map(VariableSpec::likert)
            .collect(),
            interventions: vec![
                InterventionSpec::randomized("nicotine", true),
                InterventionSpec::randomized("caffeine", true),
                InterventionSpec::plain("DXM"),
            ],
            tests: vec![
                TestSpec::Arithmetic {
                    operators: vec![Operation::Add, Operation::Sub, Operation::Mul],
                    operand_min: 1,
                    operand_max: 9,
                },
                TestSpec::NBack {
                    n: 3,
                    match_probability: 0.2,
                },
                TestSpec::Stroop {
                    palette: vec![
                        Color::Red,
                        Color::Green,
                        Color::Yellow,
                        Color::Blue,
                        Color::Magenta,
                    ],
                },
            ],
        }
    }
}

/// A self-rated variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    #[serde(default = "default_scale_min")]
    pub min: i64,
    #[serde(default = "default_scale_max")]
    pub max: i64,
}

fn default_scale_min() -> i64 {
    1
}

fn default_scale_max() -> i64 {
    5
}

impl VariableSpec {
    /// A variable rated 1-5
    pub fn likert(name: &str) -> Self {
        Self {
            name: name.to_string(),
            min: default_scale_min(),
            max: default_scale_max(),
        }
    }
}

/// What a randomization arm asks the operator to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmAction {
    /// Take the intervention now
    Apply,
    /// Do not take it this session
    Skip,
}

/// One outcome of a randomized intervention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomArm {
    pub action: ArmAction,
    /// Dose written to the log when this arm is drawn
    pub dose: String,
    /// Shown instead of the dose when the intervention is blinded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RandomArm {
    pub fn pre() -> Self {
        Self {
            action: ArmAction::Apply,
            dose: "pre".to_string(),
            label: None,
        }
    }

    pub fn post() -> Self {
        Self {
            action: ArmAction::Skip,
            dose: "post".to_string(),
            label: None,
        }
    }
}

/// A self-administered intervention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionSpec {
    pub name: String,
    /// Arms to draw from; `None` disables the randomize choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arms: Option<Vec<RandomArm>>,
    /// Applying it now requires the session to wait before testing
    #[serde(default)]
    pub wait: bool,
    /// Hide the drawn dose from the operator
    #[serde(default)]
    pub blinded: bool,
}

impl InterventionSpec {
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            arms: None,
            wait: false,
            blinded: false,
        }
    }

    /// Pre/post randomized intervention
    pub fn randomized(name: &str, wait: bool) -> Self {
        Self {
            name: name.to_string(),
            arms: Some(vec![RandomArm::pre(), RandomArm::post()]),
            wait,
            blinded: false,
        }
    }
}

/// A timed test and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestSpec {
    Arithmetic {
        operators: Vec<Operation>,
        operand_min: i64,
        operand_max: i64,
    },
    #[serde(rename = "nback")]
    NBack {
        n: usize,
        match_probability: f64,
    },
    Stroop {
        palette: Vec<Color>,
    },
}

/// Where analysis reads from and writes to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub log_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Directory holding the external dosage exports; `None` skips them
    pub dosage_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            output_dir: PathBuf::from("analysis"),
            dosage_dir: Some(PathBuf::from("~/Dropbox/android/eventrend")),
        }
    }
}

impl AnalysisConfig {
    /// Dosage directory with a leading `~` expanded
    pub fn resolved_dosage_dir(&self) -> Option<PathBuf> {
        self.dosage_dir.as_deref().map(expand_home)
    }
}

/// Habit-tracker goal updated after a completed session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user: String,
    pub goal: String,
    pub amount: f64,
    pub comment: String,
    /// Environment variable holding the API token
    pub auth_token_env: String,
    pub timeout_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://www.beeminder.com/api/v1".to_string(),
            user: "me".to_string(),
            goal: "cogtest".to_string(),
            amount: 1.0,
            comment: "semi-automatic update".to_string(),
            auth_token_env: "BEEMINDER_AUTH_TOKEN".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml(text: &str) -> Result<Self, CogError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] if it exists, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self, CogError> {
        match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_toml(&fs::read_to_string(fallback)?)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Reject configurations the session engine cannot run
    pub fn validate(&self) -> Result<(), CogError> {
        for variable in &self.session.variables {
            if variable.min > variable.max {
                return Err(CogError::Config(format!(
                    "variable '{}' has an empty range {}..={}",
                    variable.name, variable.min, variable.max
                )));
            }
        }

        for intervention in &self.session.interventions {
            if matches!(&intervention.arms, Some(arms) if arms.is_empty()) {
                return Err(CogError::Config(format!(
                    "intervention '{}' has no randomization arms",
                    intervention.name
                )));
            }
        }

        for test in &self.session.tests {
            validate_test(test)?;
        }

        Ok(())
    }
}

fn validate_test(test: &TestSpec) -> Result<(), CogError> {
    match test {
        TestSpec::Arithmetic {
            operators,
            operand_min,
            operand_max,
        } => {
            if operators.is_empty() {
                return Err(CogError::Config("arithmetic test needs an operator".into()));
            }
            if operand_min > operand_max {
                return Err(CogError::Config(format!(
                    "arithmetic operand range {}..={} is empty",
                    operand_min, operand_max
                )));
            }
            // resampling a repeat needs at least a few distinct problems to pick from
            let span = (i128::from(*operand_max) - i128::from(*operand_min) + 1) as u128;
            let mut pool = span
                .saturating_mul(span)
                .saturating_mul(operators.len() as u128);
            if operators.contains(&Operation::Div) && *operand_min <= 0 && *operand_max >= 0 {
                pool = pool.saturating_sub(span);
            }
            if pool < 3 {
                return Err(CogError::Config(
                    "arithmetic test needs at least 3 distinct problems".into(),
                ));
            }
            Ok(())
        }
        TestSpec::NBack {
            n,
            match_probability,
        } => {
            if *n == 0 {
                return Err(CogError::Config("n-back needs n >= 1".into()));
            }
            if !(0.0..=1.0).contains(match_probability) {
                return Err(CogError::Config(format!(
                    "n-back match probability {} is outside [0, 1]",
                    match_probability
                )));
            }
            Ok(())
        }
        TestSpec::Stroop { palette } => {
            let distinct: HashSet<Color> = palette.iter().copied().collect();
            if distinct.len() < 3 {
                return Err(CogError::Config(
                    "stroop palette needs at least 3 distinct colors".into(),
                ));
            }
            let initials: HashSet<char> = distinct.iter().map(Color::initial).collect();
            if initials.len() != distinct.len() {
                return Err(CogError::Config(
                    "stroop palette colors must start with different letters".into(),
                ));
            }
            Ok(())
        }
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.variables.len(), 4);
        assert_eq!(config.session.tests.len(), 3);
        assert_eq!(config.session.wait_period_secs, 300);
        assert_eq!(config.session.interventions[2].arms, None);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.session.test_duration_secs, 60);
        assert_eq!(config.analysis.output_dir, PathBuf::from("analysis"));
        assert_eq!(config.tracker.goal, "cogtest");
    }

    #[test]
    fn test_parse_custom_session() {
        let toml = r#"
            [session]
            test_duration_secs = 30

            [[session.variables]]
            name = "mood"
            min = 0
            max = 10

            [[session.interventions]]
            name = "caffeine"
            wait = true
            blinded = true
            arms = [
                { action = "apply", dose = "100mg", label = "A" },
                { action = "skip", dose = "placebo", label = "B" },
            ]

            [[session.tests]]
            kind = "arithmetic"
            operators = ["+", "/"]
            operand_min = 1
            operand_max = 9

            [[session.tests]]
            kind = "nback"
            n = 2
            match_probability = 0.3
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.session.test_duration_secs, 30);
        assert_eq!(config.session.variables[0].max, 10);
        let arms = config.session.interventions[0].arms.as_ref().unwrap();
        assert_eq!(arms[0].action, ArmAction::Apply);
        assert_eq!(arms[1].label.as_deref(), Some("B"));
        assert_eq!(
            config.session.tests[1],
            TestSpec::NBack {
                n: 2,
                match_probability: 0.3
            }
        );
    }

    #[test]
    fn test_rejects_small_stroop_palette() {
        let toml = r#"
            [[session.tests]]
            kind = "stroop"
            palette = ["red", "green"]
        "#;
        assert!(matches!(Config::from_toml(toml), Err(CogError::Config(_))));
    }

    #[test]
    fn test_rejects_colliding_initials() {
        let toml = r#"
            [[session.tests]]
            kind = "stroop"
            palette = ["red", "blue", "black"]
        "#;
        assert!(matches!(Config::from_toml(toml), Err(CogError::Config(_))));
    }

    #[test]
    fn test_rejects_tiny_arithmetic_pool() {
        let toml = r#"
            [[session.tests]]
            kind = "arithmetic"
            operators = ["+"]
            operand_min = 2
            operand_max = 2
        "#;
        assert!(matches!(Config::from_toml(toml), Err(CogError::Config(_))));
    }

    #[test]
    fn test_expand_home() {
        let plain = Path::new("logs");
        assert_eq!(expand_home(plain), PathBuf::from("logs"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/x")), home.join("x"));
        }
    }
}
