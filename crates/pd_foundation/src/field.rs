// crates/pd_foundation/src/field.rs

//! 场缓冲区模型
//!
//! 定义输出子系统的公共数据通货：一个命名的、带类型的逐实体数组。
//! 所有格式后端都以 [`FieldValues`] 作为唯一的场数据输入类型。
//!
//! # 设计说明
//!
//! 求解器按节点或单元索引提供标量 / 三维向量 / 对称张量 / 全张量数组。
//! [`FieldValues`] 的各变体对应不同的数值存储类型（如固定标志用 u8、
//! 邻居计数用 u64），落盘时保持原始数值类型不做隐式降精度。
//!
//! # 对称张量分量顺序
//!
//! `SymTensor3` 存储 6 个独立分量，顺序为 `[xx, yy, zz, xy, yz, xz]`。
//! 展开为 3×3 矩阵时按行排列：
//!
//! ```text
//! | xx xy xz |   | t0 t3 t5 |
//! | xy yy yz | = | t3 t1 t4 |
//! | xz yz zz |   | t5 t4 t2 |
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PdError, PdResult};

/// 场的几何类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// 标量（1 分量）
    Scalar,
    /// 三维向量（3 分量）
    Vector3,
    /// 对称 3×3 张量（6 独立分量）
    SymTensor3,
    /// 一般 3×3 张量（9 分量）
    Tensor3x3,
}

impl FieldKind {
    /// 分量数
    pub fn n_components(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector3 => 3,
            Self::SymTensor3 => 6,
            Self::Tensor3x3 => 9,
        }
    }
}

/// 场数据数组
///
/// 五个标量变体对应求解器交出的不同数值类型，
/// 几何类型上均归约为 [`FieldKind::Scalar`]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValues {
    /// f64 标量数组
    Float64(Vec<f64>),
    /// f32 标量数组
    Float32(Vec<f32>),
    /// u8 标量数组（如固定标志）
    UInt8(Vec<u8>),
    /// i32 标量数组
    Int32(Vec<i32>),
    /// u64 标量数组（如邻居计数）
    UInt64(Vec<u64>),
    /// 三维向量数组
    Vector3(Vec<[f64; 3]>),
    /// 对称张量数组，分量顺序 [xx, yy, zz, xy, yz, xz]
    SymTensor3(Vec<[f64; 6]>),
    /// 全张量数组，按行排列
    Tensor3x3(Vec<[f64; 9]>),
}

impl FieldValues {
    /// 实体数（节点数或单元数）
    pub fn len(&self) -> usize {
        match self {
            Self::Float64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::UInt8(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Vector3(v) => v.len(),
            Self::SymTensor3(v) => v.len(),
            Self::Tensor3x3(v) => v.len(),
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 几何类型
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Float64(_) | Self::Float32(_) | Self::UInt8(_) | Self::Int32(_) | Self::UInt64(_) => {
                FieldKind::Scalar
            }
            Self::Vector3(_) => FieldKind::Vector3,
            Self::SymTensor3(_) => FieldKind::SymTensor3,
            Self::Tensor3x3(_) => FieldKind::Tensor3x3,
        }
    }

    /// 每实体分量数
    pub fn n_components(&self) -> usize {
        self.kind().n_components()
    }
}

/// 场的关联实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Association {
    /// 逐节点
    PerNode,
    /// 逐单元
    PerCell,
}

/// 场缓冲区
///
/// 快照内命名唯一的逐实体数组，与网格的节点或单元索引一一对齐。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldBuffer {
    /// 场名称（同一快照内唯一）
    pub name: String,
    /// 关联实体
    pub association: Association,
    /// 数据数组
    pub values: FieldValues,
}

impl FieldBuffer {
    /// 创建场缓冲区
    pub fn new(name: impl Into<String>, association: Association, values: FieldValues) -> Self {
        Self {
            name: name.into(),
            association,
            values,
        }
    }

    /// 几何类型
    pub fn kind(&self) -> FieldKind {
        self.values.kind()
    }

    /// 实体数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 校验长度与网格实体数一致
    ///
    /// 长度不匹配是契约违规，调用方不得静默截断。
    pub fn check_len(&self, expected: usize) -> PdResult<()> {
        PdError::check_size(&self.name, expected, self.values.len())
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_components() {
        assert_eq!(FieldKind::Scalar.n_components(), 1);
        assert_eq!(FieldKind::Vector3.n_components(), 3);
        assert_eq!(FieldKind::SymTensor3.n_components(), 6);
        assert_eq!(FieldKind::Tensor3x3.n_components(), 9);
    }

    #[test]
    fn test_scalar_variants_collapse() {
        assert_eq!(FieldValues::Float64(vec![1.0]).kind(), FieldKind::Scalar);
        assert_eq!(FieldValues::Float32(vec![1.0]).kind(), FieldKind::Scalar);
        assert_eq!(FieldValues::UInt8(vec![1]).kind(), FieldKind::Scalar);
        assert_eq!(FieldValues::Int32(vec![1]).kind(), FieldKind::Scalar);
        assert_eq!(FieldValues::UInt64(vec![1]).kind(), FieldKind::Scalar);
    }

    #[test]
    fn test_len() {
        let v = FieldValues::Vector3(vec![[0.0; 3]; 4]);
        assert_eq!(v.len(), 4);
        assert_eq!(v.n_components(), 3);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_check_len() {
        let buf = FieldBuffer::new(
            "Velocity",
            Association::PerNode,
            FieldValues::Vector3(vec![[0.0; 3]; 4]),
        );
        assert!(buf.check_len(4).is_ok());
        assert!(buf.check_len(5).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let buf = FieldBuffer::new(
            "Strain_Tensor",
            Association::PerNode,
            FieldValues::SymTensor3(vec![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]]),
        );
        let json = serde_json::to_string(&buf).unwrap();
        let parsed: FieldBuffer = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "Strain_Tensor");
        assert_eq!(parsed.values, buf.values);
    }
}
