//! 应用配置
//!
//! 依次合并：内建默认值 → 可选配置文件 → `RELAY__` 前缀的环境变量。
//! 环境变量以 `__` 分隔层级，例如 `RELAY__BROKER__BACKEND=memory`、`RELAY__LOG__JSON=true`。
//!
use crate::error::AppResult;
use config::{Config, Environment, File};
use relay_broker::codec::JSON;
use serde::Deserialize;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "RELAY";
/// 内存后端名称
pub const MEMORY_BACKEND: &str = "memory";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    /// 后端名称；本仓库只提供 `memory`，其余由外部适配器提供
    pub backend: String,
    /// 生产者默认使用的 content-type，启动时校验其 codec 已注册
    pub default_content_type: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            backend: MEMORY_BACKEND.to_string(),
            default_content_type: JSON.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` 指令，例如 `info` 或 `relay_broker=debug,info`
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// 从可选配置文件与进程环境变量加载配置
pub fn load_config(path: Option<&str>) -> AppResult<Settings> {
    load_config_from(path, None)
}

/// 与 `load_config` 相同，但可指定环境变量来源（`None` 表示读取进程环境）
pub fn load_config_from(
    path: Option<&str>,
    env: Option<config::Map<String, String>>,
) -> AppResult<Settings> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path).required(false));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_without_sources() {
        let settings = load_config_from(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.broker.backend, "memory");
        assert_eq!(settings.broker.default_content_type, "json");
        assert_eq!(settings.log.level, "info");
        assert!(!settings.log.json);
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = load_config_from(
            None,
            env(&[
                ("RELAY__LOG__LEVEL", "debug"),
                ("RELAY__LOG__JSON", "true"),
                ("OTHER__LOG__LEVEL", "trace"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.log.level, "debug");
        assert!(settings.log.json);
        assert_eq!(settings.broker, BrokerSettings::default());
    }

    #[test]
    fn file_then_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[broker]\nbackend = \"nats\"\ndefault_content_type = \"msgpack\"\n\n[log]\nlevel = \"warn\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let settings =
            load_config_from(Some(&path), env(&[("RELAY__BROKER__BACKEND", "memory")])).unwrap();

        assert_eq!(settings.broker.backend, "memory");
        assert_eq!(settings.broker.default_content_type, "msgpack");
        assert_eq!(settings.log.level, "warn");
    }

    #[test]
    fn missing_file_is_tolerated() {
        let settings = load_config_from(Some("/nonexistent/relay"), env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
