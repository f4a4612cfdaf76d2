// crates/pd_io/src/lib.rs

//! # PeriDyn IO Layer (Layer 3)
//!
//! 模拟输出子系统：把每个时间步的网格与状态快照写成
//! VTK XML（`.vtu`）、传统 ASCII VTK（`.vtk`）或 GMSH 2.2（`.msh`）
//! 文件。
//!
//! ## 分层结构
//!
//! - [`snapshot`]: 网格与状态快照类型
//! - [`exporters`]: 三种格式后端与共享暂存缓冲
//! - [`writer`]: 多格式门面，未知格式静默退化为空操作
//! - [`pipeline`]: 按输出策略编排一次时间步的完整写出
//!
//! ## 依赖规则
//!
//! 仅依赖 pd_foundation (L1) 与 pd_config (L2)。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod exporters;
pub mod pipeline;
pub mod snapshot;
pub mod writer;

pub use error::{IoError, IoResult};
pub use exporters::FormatBackend;
pub use pipeline::{completion_percent, OutputPipeline, StepError};
pub use snapshot::{ElementType, MeshSnapshot, StateSnapshot};
pub use writer::Writer;

/// 本 crate 所处层级
pub const LAYER: u8 = 3;
