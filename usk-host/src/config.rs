//! # Config 模块
//!
//! 宿主配置，从 `usk.json` 读取。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高，`--config`、`--scripts`）
//! 2. 配置文件 (usk.json)
//! 3. 默认值（最低）
//!
//! 配置文件缺失或无法解析时回退到默认值，不会阻止启动。

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "usk.json";

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 脚本目录
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    /// 脚本扩展名（不含点）
    #[serde(default = "default_script_extension")]
    pub script_extension: String,

    /// 严格解析：任何被跳过的行都会让加载失败
    #[serde(default)]
    pub strict_parsing: bool,

    /// 启动时写入示例脚本 showcase.usk
    #[serde(default = "default_create_showcase")]
    pub create_showcase: bool,

    /// 默认日志级别，`RUST_LOG` 优先
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 计时器轮询间隔（毫秒）
    #[serde(default = "default_timer_resolution_ms")]
    pub timer_resolution_ms: u64,

    /// 控制台玩家初始状态
    #[serde(default)]
    pub player: PlayerSeed,
}

/// 控制台玩家初始状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeed {
    #[serde(default = "default_player_name")]
    pub name: String,

    #[serde(default = "default_player_id")]
    pub id: String,

    /// 为空时使用 `name`
    #[serde(default)]
    pub display_name: String,

    #[serde(default = "default_player_group")]
    pub group: String,

    /// 拥有的权限节点，`*` 表示全部
    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub money: Decimal,

    #[serde(default = "default_vital")]
    pub health: u8,

    #[serde(default = "default_vital")]
    pub food: u8,

    #[serde(default = "default_vital")]
    pub water: u8,

    #[serde(default = "default_vital")]
    pub stamina: u8,

    #[serde(default)]
    pub virus: u8,

    #[serde(default)]
    pub experience: u32,

    #[serde(default)]
    pub reputation: i32,
}

impl PlayerSeed {
    /// 实际显示名
    pub fn effective_display_name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

// 默认值函数
fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_script_extension() -> String {
    usk_runtime::DEFAULT_EXTENSION.to_string()
}

fn default_create_showcase() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timer_resolution_ms() -> u64 {
    1000
}

fn default_player_name() -> String {
    "Console".to_string()
}

fn default_player_id() -> String {
    "0".to_string()
}

fn default_player_group() -> String {
    "default".to_string()
}

fn default_vital() -> u8 {
    100
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            script_extension: default_script_extension(),
            strict_parsing: false,
            create_showcase: default_create_showcase(),
            log_level: default_log_level(),
            timer_resolution_ms: default_timer_resolution_ms(),
            player: PlayerSeed::default(),
        }
    }
}

impl Default for PlayerSeed {
    fn default() -> Self {
        Self {
            name: default_player_name(),
            id: default_player_id(),
            display_name: String::new(),
            group: default_player_group(),
            permissions: Vec::new(),
            money: Decimal::ZERO,
            health: default_vital(),
            food: default_vital(),
            water: default_vital(),
            stamina: default_vital(),
            virus: 0,
            experience: 0,
            reputation: 0,
        }
    }
}

impl HostConfig {
    /// 读取并解析配置文件
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 加载配置文件
    ///
    /// 失败时返回默认配置，并附带失败原因供调用方在日志就绪后输出。
    pub fn load(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::try_load(path) {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(ConfigError::SerializationFailed)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scripts_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "scripts_dir 不能为空".to_string(),
            ));
        }

        if self.script_extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::ValidationFailed(
                "script_extension 不能为空".to_string(),
            ));
        }

        if self.timer_resolution_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "timer_resolution_ms 必须大于 0".to_string(),
            ));
        }

        if self.player.name.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "player.name 不能为空".to_string(),
            ));
        }

        Ok(())
    }

    /// 去掉前导点的扩展名
    pub fn extension(&self) -> &str {
        self.script_extension.trim_start_matches('.')
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {}", .0.display())]
    NotFound(PathBuf),

    #[error("配置 IO 错误: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置序列化失败")]
    SerializationFailed(#[source] serde_json::Error),

    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
