// crates/pd_io/src/error.rs

//! IO 错误类型定义
//!
//! 提供 IO 模块的统一错误枚举，支持通过 thiserror 自动转换底层错误。
//! 所有错误向编排器的调用方（模拟驱动）透传，写入器内部不做恢复。

use pd_foundation::PdError;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 底层文件系统错误（打开 / 写入 / 刷新失败）
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 同名场在同一文件内重复追加
    #[error("场名重复: {name} 已存在于当前文件")]
    DuplicateField {
        /// 重复的场名
        name: String,
    },

    /// 连接数组长度不是每单元节点数的整数倍
    #[error("连接数组长度无效: {len} 不是每单元节点数 {nodes_per_element} 的整数倍")]
    InvalidConnectivity {
        /// 连接数组长度
        len: usize,
        /// 每单元节点数
        nodes_per_element: usize,
    },

    /// 场数组长度与网格实体数不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 场名称
        name: String,
        /// 期望大小（网格节点数或单元数）
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 写入器已关闭后继续追加
    #[error("写入器已关闭")]
    Closed,

    /// 基础层错误转换
    #[error("基础层错误: {0}")]
    Foundation(#[from] PdError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_field_display() {
        let err = IoError::DuplicateField {
            name: "Displacement".to_string(),
        };
        assert!(err.to_string().contains("Displacement"));
    }

    #[test]
    fn test_foundation_conversion() {
        let err: IoError = PdError::invalid_mesh("测试").into();
        assert!(matches!(err, IoError::Foundation(_)));
    }
}
