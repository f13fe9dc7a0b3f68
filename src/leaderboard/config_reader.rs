use crate::args::Args;
use crate::leaderboard::*;

use serde::{Deserialize, Serialize};
use std::fs;

// Compiled-in defaults. They can be changed with a settings file.
pub const MIN_PERIODS: u32 = 4;
pub const BALANCE_THRESHOLD: f64 = 80_000.0;
pub const MAX_ROWS: usize = 100;

pub const DEFAULT_INPUT_FILE: &str = "Pendle_leaderboard.xlsx";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "output";
pub const REWARD_SUFFIX: &str = " ETH";
pub const IDENTIFIER_PATTERN: &str = r"fadd=([^&]+)";

/// The names of the required columns, as they appear in the header of each worksheet.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub rank: String,
    pub user: String,
    #[serde(rename = "totalRewards")]
    pub total_rewards: String,
    pub rate: String,
    pub balance: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            rank: "#".to_string(),
            user: "User".to_string(),
            total_rewards: "Total Rewards".to_string(),
            rate: "ETH per 1000 vePENDLE (APR)".to_string(),
            balance: "vePENDLE Balance".to_string(),
        }
    }
}

impl ColumnNames {
    /// All the columns, in the order of the fields of a raw row.
    pub fn required(&self) -> [&str; 5] {
        [
            self.rank.as_str(),
            self.user.as_str(),
            self.total_rewards.as_str(),
            self.rate.as_str(),
            self.balance.as_str(),
        ]
    }
}

/// The content of a settings file. Everything is optional.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "inputFile")]
    pub input_file: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "minPeriods")]
    pub min_periods: Option<u32>,
    #[serde(rename = "balanceThreshold")]
    pub balance_threshold: Option<f64>,
    #[serde(rename = "maxRows")]
    pub max_rows: Option<usize>,
    #[serde(rename = "rewardSuffix")]
    pub reward_suffix: Option<String>,
    #[serde(rename = "identifierPattern")]
    pub identifier_pattern: Option<String>,
    pub columns: Option<ColumnNames>,
}

/// The settings of a run, after applying the defaults, the settings file and the command line.
#[derive(PartialEq, Debug, Clone)]
pub struct Settings {
    pub input_file: PathBuf,
    pub output_directory: PathBuf,
    pub thresholds: ReportThresholds,
    pub reward_suffix: String,
    pub identifier_pattern: String,
    pub columns: ColumnNames,
}

impl Settings {
    /// The default settings, with the files located in the given directory.
    pub fn defaults_in(base_dir: &Path) -> Settings {
        Settings {
            input_file: base_dir.join(DEFAULT_INPUT_FILE),
            output_directory: base_dir.join(DEFAULT_OUTPUT_DIRECTORY),
            thresholds: ReportThresholds {
                min_periods: MIN_PERIODS,
                balance_threshold: BALANCE_THRESHOLD,
                max_rows: MAX_ROWS,
            },
            reward_suffix: REWARD_SUFFIX.to_string(),
            identifier_pattern: IDENTIFIER_PATTERN.to_string(),
            columns: ColumnNames::default(),
        }
    }

    /// Applies a settings file. Relative paths are resolved against `config_dir`.
    pub fn with_config(self, config: &RunConfig, config_dir: &Path) -> Settings {
        Settings {
            input_file: config
                .input_file
                .as_ref()
                .map(|p| config_dir.join(p))
                .unwrap_or(self.input_file),
            output_directory: config
                .output_directory
                .as_ref()
                .map(|p| config_dir.join(p))
                .unwrap_or(self.output_directory),
            thresholds: ReportThresholds {
                min_periods: config.min_periods.unwrap_or(self.thresholds.min_periods),
                balance_threshold: config
                    .balance_threshold
                    .unwrap_or(self.thresholds.balance_threshold),
                max_rows: config.max_rows.unwrap_or(self.thresholds.max_rows),
            },
            reward_suffix: config.reward_suffix.clone().unwrap_or(self.reward_suffix),
            identifier_pattern: config
                .identifier_pattern
                .clone()
                .unwrap_or(self.identifier_pattern),
            columns: config.columns.clone().unwrap_or(self.columns),
        }
    }
}

pub fn read_config(path: &str) -> BLeaderboardResult<RunConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read config: {:?}", contents);
    let config: RunConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// The directory of the running program. The default input and output are located there.
fn program_dir() -> BLeaderboardResult<PathBuf> {
    let exe = std::env::current_exe().context(LocatingExecutableSnafu {})?;
    let dir = exe.parent().context(MissingParentDirSnafu {
        path: exe.display().to_string(),
    })?;
    Ok(dir.to_path_buf())
}

/// Resolves the settings: defaults, then the settings file, then the command line.
pub fn resolve_settings(args: &Args) -> BLeaderboardResult<Settings> {
    let mut settings = Settings::defaults_in(&program_dir()?);

    if let Some(config_path) = args.config.as_ref() {
        let config = read_config(config_path)?;
        info!("config: {:?}", config);
        let config_dir = Path::new(config_path)
            .parent()
            .context(MissingParentDirSnafu {
                path: config_path.clone(),
            })?;
        settings = settings.with_config(&config, config_dir);
    }

    if let Some(input) = args.input.as_ref() {
        settings.input_file = PathBuf::from(input);
    }
    if let Some(out) = args.out.as_ref() {
        settings.output_directory = PathBuf::from(out);
    }
    debug!("resolve_settings: {:?}", settings);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_leaderboard_format() {
        let s = Settings::defaults_in(Path::new("/opt/tool"));
        assert_eq!(s.input_file, Path::new("/opt/tool/Pendle_leaderboard.xlsx"));
        assert_eq!(s.output_directory, Path::new("/opt/tool/output"));
        assert_eq!(s.thresholds, ReportThresholds::DEFAULT_THRESHOLDS);
        assert_eq!(
            s.columns.required(),
            [
                "#",
                "User",
                "Total Rewards",
                "ETH per 1000 vePENDLE (APR)",
                "vePENDLE Balance"
            ]
        );
    }

    #[test]
    fn settings_file_overrides_defaults() {
        let js = r#"{
            "minPeriods": 2,
            "maxRows": 10,
            "outputDirectory": "reports",
            "columns": { "balance": "Balance" }
        }"#;
        let config: RunConfig = serde_json::from_str(js).unwrap();
        let s = Settings::defaults_in(Path::new("/opt/tool")).with_config(&config, Path::new("/data"));
        assert_eq!(s.thresholds.min_periods, 2);
        assert_eq!(s.thresholds.max_rows, 10);
        assert_eq!(s.thresholds.balance_threshold, BALANCE_THRESHOLD);
        assert_eq!(s.output_directory, Path::new("/data/reports"));
        assert_eq!(s.input_file, Path::new("/opt/tool/Pendle_leaderboard.xlsx"));
        assert_eq!(s.columns.balance, "Balance");
        // Columns that are not mentioned keep their default name.
        assert_eq!(s.columns.user, "User");
    }

    #[test]
    fn config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("settings.json");
        fs::write(&p, r#"{"balanceThreshold": 5000.5, "rewardSuffix": " USDC"}"#).unwrap();
        let config = read_config(p.to_str().unwrap()).unwrap();
        assert_eq!(config.balance_threshold, Some(5000.5));
        assert_eq!(config.reward_suffix, Some(" USDC".to_string()));

        fs::write(&p, "{ not json").unwrap();
        assert!(matches!(
            read_config(p.to_str().unwrap()).map_err(|e| *e),
            Err(LeaderboardError::ParsingJson { .. })
        ));
    }
}
