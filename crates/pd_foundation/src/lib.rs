// crates/pd_foundation/src/lib.rs

//! PeriDyn Foundation Layer (Layer 1)
//!
//! 基础层，提供统一错误类型和场数据模型。
//!
//! # 模块概览
//!
//! - [`error`]: `PdError` 枚举与 `PdResult` 类型别名
//! - [`field`]: 场缓冲区模型（标量 / 向量 / 张量，逐节点或逐单元）
//!
//! # 层级架构
//!
//! ```text
//! Layer 3: pd_io         ─> 格式后端、写入器门面、输出管道
//! Layer 2: pd_config     ─> OutputConfig 输出策略
//! Layer 1: pd_foundation ─> PdError, FieldBuffer (本层)
//! ```
//!
//! # 设计原则
//!
//! 1. **无上层依赖**: 本层不依赖任何其他 pd_* crate
//! 2. **数据通货**: [`field::FieldBuffer`] 是所有格式后端的公共输入类型

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod field;

/// 层级标识
pub const LAYER: u8 = 1;

// 重导出核心类型
pub use error::{PdError, PdResult};
pub use field::{Association, FieldBuffer, FieldKind, FieldValues};
