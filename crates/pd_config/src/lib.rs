// crates/pd_config/src/lib.rs

//! PeriDyn Config Layer (Layer 2)
//!
//! 配置层，提供输出策略的解析与校验。
//!
//! # 模块概览
//!
//! - [`output_config`]: `OutputConfig` 输出策略（启用场、目录、间隔、格式）
//! - [`error`]: 配置错误类型
//!
//! # 设计原则
//!
//! 1. **只读策略**: `OutputConfig` 构造并校验后不再变更
//! 2. **全 JSON 配置**: 通过 serde 从 JSON 加载，字段带默认值
//! 3. **格式不预判**: `format` 保持为自由字符串，未知格式由写入器门面降级处理

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod output_config;

/// 层级标识
pub const LAYER: u8 = 2;

// 重导出核心类型
pub use error::ConfigError;
pub use output_config::{ErrorScope, OutputConfig, KNOWN_FORMATS};
