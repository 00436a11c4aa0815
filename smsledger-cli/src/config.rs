use anyhow::{Context, Result, anyhow, bail};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use smsledger_core::DailySchedule;
use smsledger_ingest::{CommandSource, DEFAULT_SMS_COMMAND, PatternSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::home::expand_home;

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Sender address the bank texts from
    pub bank_number: String,
    /// Ledger markdown file; `~/` is expanded
    pub obsidian_path: String,
    /// Short bank tag written in the `bank` column
    pub bank_identifier: String,
    pub regex_patterns: RegexPatterns,

    /// Command that prints all SMS as JSON (default: termux-sms-list)
    #[serde(default = "default_sms_command")]
    pub sms_command: String,
    #[serde(default)]
    pub sms_args: Vec<String>,

    #[serde(default)]
    pub schedule: ScheduleSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexPatterns {
    pub amount: String,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Daily run time, "HH:MM"
    #[serde(default = "default_run_at")]
    pub run_at: String,
    /// IANA zone like "Asia/Tehran"; machine local time when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

fn default_sms_command() -> String {
    DEFAULT_SMS_COMMAND.to_string()
}

fn default_run_at() -> String {
    "23:59".to_string()
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            run_at: default_run_at(),
            timezone: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Replace with your bank's SMS number
            bank_number: "+1234567890".to_string(),
            obsidian_path: "~/Documents/Obsidian/Costs.md".to_string(),
            bank_identifier: "BANK".to_string(),
            regex_patterns: RegexPatterns {
                amount: r"(\d{1,3}(?:,\d{3})*)-".to_string(),
                balance: r"balance:(\d{1,3}(?:,\d{3})*)".to_string(),
            },
            sms_command: default_sms_command(),
            sms_args: Vec::new(),
            schedule: ScheduleSection::default(),
        }
    }
}

impl Config {
    pub fn ledger_path(&self) -> PathBuf {
        expand_home(&self.obsidian_path)
    }

    pub fn patterns(&self) -> Result<PatternSet> {
        PatternSet::new(&self.regex_patterns.amount, &self.regex_patterns.balance)
            .context("regex_patterns")
    }

    pub fn daily_schedule(&self) -> Result<DailySchedule> {
        DailySchedule::parse(&self.schedule.run_at)
            .ok_or_else(|| anyhow!("schedule.run_at must be HH:MM, got {:?}", self.schedule.run_at))
    }

    pub fn timezone(&self) -> Result<Option<Tz>> {
        self.schedule
            .timezone
            .as_deref()
            .map(|tz| {
                tz.parse::<Tz>()
                    .map_err(|_| anyhow!("invalid timezone: {tz}"))
            })
            .transpose()
    }

    pub fn message_source(&self) -> CommandSource {
        CommandSource::new(self.sms_command.clone(), self.sms_args.clone())
    }

    /// Fields a pass cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.bank_number.trim().is_empty() {
            bail!("bank_number is empty");
        }
        self.patterns()?;
        Ok(())
    }

    pub fn validate_schedule(&self) -> Result<()> {
        self.daily_schedule()?;
        self.timezone()?;
        Ok(())
    }
}

/// `config.json` next to the running executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("locate executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("executable has no parent dir: {}", exe.display()))?;
    Ok(dir.join(CONFIG_FILE))
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

/// Read, parse and validate a config file (JSON, or TOML by extension).
pub fn read_config(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut cfg: Config = if is_toml(path) {
        toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?
    } else {
        serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
    };
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    if let Err(e) = cfg.validate_schedule() {
        warn!("Invalid schedule in {}: {e:#}; using default schedule", path.display());
        cfg.schedule = ScheduleSection::default();
    }
    Ok(cfg)
}

/// Load the config, falling back to [`Config::default`] on any failure.
pub fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(p) => read_config(p),
        None => default_config_path().and_then(|p| read_config(&p)),
    };

    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Error loading config: {e:#}; using defaults");
            Config::default()
        }
    }
}

/// Write the default config to `path` unless a file is already there.
pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        info!("Config already exists: {}", path.display());
        return Ok(());
    }
    let cfg = Config::default();
    let s = if is_toml(path) {
        toml::to_string_pretty(&cfg).context("serialize config")?
    } else {
        serde_json::to_string_pretty(&cfg).context("serialize config")?
    };
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let p = dir.join(name);
        fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn test_default_is_valid() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.sms_command, "termux-sms-list");
        assert_eq!(cfg.schedule.run_at, "23:59");
    }

    #[test]
    fn test_reads_minimal_json() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            dir.path(),
            "config.json",
            r#"{
                "bank_number": "+98300",
                "obsidian_path": "/notes/Costs.md",
                "bank_identifier": "M",
                "regex_patterns": {"amount": "(\\d+)-", "balance": "mande:(\\d+)"}
            }"#,
        );

        let cfg = read_config(&p).unwrap();
        assert_eq!(cfg.bank_number, "+98300");
        assert_eq!(cfg.ledger_path(), PathBuf::from("/notes/Costs.md"));
        assert_eq!(cfg.sms_command, "termux-sms-list");
        assert!(cfg.sms_args.is_empty());
        assert_eq!(cfg.schedule, ScheduleSection::default());
    }

    #[test]
    fn test_reads_toml_with_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            dir.path(),
            "config.toml",
            r#"
bank_number = "+98300"
obsidian_path = "~/Costs.md"
bank_identifier = "M"

[regex_patterns]
amount = '(\d+)-'
balance = 'balance:(\d+)'

[schedule]
run_at = "21:30"
timezone = "America/Chicago"
"#,
        );

        let cfg = read_config(&p).unwrap();
        assert_eq!(cfg.daily_schedule().unwrap(), DailySchedule::parse("21:30").unwrap());
        assert_eq!(cfg.timezone().unwrap(), Some(chrono_tz::America::Chicago));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("nope.json")));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "config.json", "{ not json");
        assert_eq!(load_config(Some(&p)), Config::default());
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            dir.path(),
            "config.json",
            r#"{
                "bank_number": "+1",
                "obsidian_path": "/x.md",
                "bank_identifier": "M",
                "regex_patterns": {"amount": "\\d+-", "balance": "balance:(\\d+)"}
            }"#,
        );

        assert!(read_config(&p).is_err());
        assert_eq!(load_config(Some(&p)), Config::default());
    }

    #[test]
    fn test_bad_schedule_is_rejected() {
        let mut cfg = Config::default();
        cfg.schedule.run_at = "9pm".to_string();
        assert!(cfg.validate_schedule().is_err());

        let mut cfg = Config::default();
        cfg.schedule.timezone = Some("Mars/Olympus".to_string());
        assert!(cfg.validate_schedule().is_err());
    }

    #[test]
    fn test_bad_timezone_resets_only_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(
            dir.path(),
            "config.json",
            r#"{
                "bank_number": "+98300",
                "obsidian_path": "/notes/Costs.md",
                "bank_identifier": "M",
                "regex_patterns": {"amount": "(\\d+)-", "balance": "mande:(\\d+)"},
                "schedule": {"run_at": "21:30", "timezone": "Asia/Tehrn"}
            }"#,
        );

        let cfg = load_config(Some(&p));
        assert_eq!(cfg.bank_number, "+98300");
        assert_eq!(cfg.ledger_path(), PathBuf::from("/notes/Costs.md"));
        assert_eq!(cfg.regex_patterns.balance, r"mande:(\d+)");
        assert_eq!(cfg.schedule, ScheduleSection::default());
    }

    #[test]
    fn test_init_config_roundtrips_and_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("config.json");

        init_config(&p).unwrap();
        assert_eq!(read_config(&p).unwrap(), Config::default());

        fs::write(&p, "custom").unwrap();
        init_config(&p).unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "custom");
    }
}
