//! 应用配置
//!
//! 从 `<config_dir>/agenda-consulta/config.toml` 读取，文件不存在时使用默认值：
//! - 医生列表
//! - 表格占位行数
//! - 新预约默认时长（也是空闲时段的步长）
//! - 每天的工作时间
//! - 日志级别

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AgendaError, Result};
use crate::models::TimeRange;

pub const APP_DIR: &str = "agenda-consulta";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_physicians")]
    pub physicians: Vec<String>,

    /// 表格至少显示的行数，不足时用空行补齐
    #[serde(default = "default_placeholder_rows")]
    pub placeholder_rows: usize,

    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,

    #[serde(default = "default_day_start")]
    pub day_start: String,

    #[serde(default = "default_day_end")]
    pub day_end: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_physicians() -> Vec<String> {
    vec![
        "Dra. Helena Costa".to_string(),
        "Dr. Paulo Mendes".to_string(),
        "Dra. Marina Alves".to_string(),
    ]
}

fn default_placeholder_rows() -> usize {
    4
}

fn default_duration_minutes() -> u32 {
    30
}

fn default_day_start() -> String {
    "08:00".to_string()
}

fn default_day_end() -> String {
    "18:00".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            physicians: default_physicians(),
            placeholder_rows: default_placeholder_rows(),
            default_duration_minutes: default_duration_minutes(),
            day_start: default_day_start(),
            day_end: default_day_end(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// 读取默认位置的配置
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.physicians.iter().all(|name| name.trim().is_empty()) {
            return Err(AgendaError::Config(
                "a lista de médicos está vazia".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for name in self.physicians.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            if !seen.insert(name) {
                return Err(AgendaError::Config(format!("médico repetido: {}", name)));
            }
        }
        if self.default_duration_minutes == 0 {
            return Err(AgendaError::Config(
                "default_duration_minutes deve ser maior que zero".to_string(),
            ));
        }
        self.working_hours()?;
        Ok(())
    }

    /// 每天可预约的时间窗口
    pub fn working_hours(&self) -> Result<TimeRange> {
        TimeRange::parse(&self.day_start, &self.day_end)
            .map_err(|e| AgendaError::Config(format!("horário de trabalho: {}", e)))
    }

    /// 去掉空白名字后的医生列表
    pub fn physician_names(&self) -> Vec<String> {
        self.physicians
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("diretório de configuração indisponível".into()))?;
        Ok(dir.join(APP_DIR).join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.physicians.len(), 3);
        assert_eq!(config.placeholder_rows, 4);
        assert_eq!(config.default_duration_minutes, 30);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.day_start, "08:00");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml("physicians = [\"Dr. Rui\", \"  \"]\n").unwrap();
        assert_eq!(config.physician_names(), vec!["Dr. Rui".to_string()]);
        assert_eq!(config.placeholder_rows, 4);
    }

    #[test]
    fn test_empty_physicians_rejected() {
        assert!(matches!(
            Config::from_toml("physicians = []"),
            Err(AgendaError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_physicians_rejected() {
        let err = Config::from_toml("physicians = [\"Dr. Rui\", \" Dr. Rui \"]").unwrap_err();
        assert!(matches!(err, AgendaError::Config(ref m) if m.contains("Dr. Rui")));
    }

    #[test]
    fn test_working_hours() {
        let window = Config::default().working_hours().unwrap();
        assert_eq!(window.to_string(), "08:00–18:00");
        assert!(matches!(
            Config::from_toml("day_start = \"19:00\""),
            Err(AgendaError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml("placeholder_rows = \"muitas\""),
            Err(AgendaError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("agenda-consulta-nao-existe.toml");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
