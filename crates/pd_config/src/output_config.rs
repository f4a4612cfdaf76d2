// crates/pd_config/src/output_config.rs

//! OutputConfig - 输出策略
//!
//! 决定每次模拟运行输出哪些场、写到哪个目录、每隔多少步写一个文件、
//! 以及使用哪种文件格式。构造并校验后对编排器只读。
//!
//! # 设计说明
//!
//! `format` 有意保持为自由字符串而不是封闭枚举：未知格式不是配置错误，
//! 而是在写入器门面处降级为静默无操作（与既有行为保持一致）。
//! [`KNOWN_FORMATS`] 列出会真正产生文件的三种格式。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// 会产生文件的格式名
pub const KNOWN_FORMATS: [&str; 3] = ["vtu", "legacy_vtk", "msh"];

/// 场写入失败的波及范围
///
/// 重复场名或长度不匹配等错误固定中止当前文件；
/// 是否进一步中止整个运行由该策略决定，交由驱动层判断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorScope {
    /// 仅当前时间步的文件作废，运行继续
    #[default]
    File,
    /// 整个运行应当中止
    Run,
}

/// 输出策略
///
/// 对应输入文件中的输出配置块，全部字段带默认值。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 启用输出的场名集合
    #[serde(default)]
    pub tags: Vec<String>,

    /// 输出目录
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// 输出间隔（每 k 步一个文件，文件序号 = 步号 / k）
    #[serde(default = "default_dt_out")]
    pub dt_out_criteria: usize,

    /// 是否输出有限元网格（false 时退化为点云）
    #[serde(default = "default_perform_fe_out")]
    pub perform_fe_out: bool,

    /// 输出格式（"vtu" / "legacy_vtk" / "msh"，未知格式降级为无操作）
    #[serde(default = "default_format")]
    pub format: String,

    /// 压缩类型（ASCII 输出忽略）
    #[serde(default)]
    pub compression: String,

    /// 场写入失败的波及范围
    #[serde(default)]
    pub error_scope: ErrorScope,
}

fn default_directory() -> PathBuf {
    PathBuf::from("out")
}
fn default_dt_out() -> usize {
    1
}
fn default_perform_fe_out() -> bool {
    true
}
fn default_format() -> String {
    "vtu".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            directory: default_directory(),
            dt_out_criteria: default_dt_out(),
            perform_fe_out: default_perform_fe_out(),
            format: default_format(),
            compression: String::new(),
            error_scope: ErrorScope::default(),
        }
    }
}

impl OutputConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;

        let config: OutputConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 验证配置有效性
    ///
    /// 未知的 `format` 不在此处拒绝，由写入器门面降级处理。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dt_out_criteria == 0 {
            return Err(ConfigError::InvalidValue {
                key: "dt_out_criteria".to_string(),
                value: self.dt_out_criteria.to_string(),
                reason: "输出间隔必须为正".to_string(),
            });
        }
        Ok(())
    }

    /// 场名是否启用输出
    pub fn is_tag_in_output(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// 格式是否会真正产生文件
    pub fn is_known_format(&self) -> bool {
        KNOWN_FORMATS.contains(&self.format.as_str())
    }
}
