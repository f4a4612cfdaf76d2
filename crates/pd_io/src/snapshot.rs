// crates/pd_io/src/snapshot.rs

//! 网格和状态快照
//!
//! 每个时间步由外部求解器产出一对只读快照，供输出管道消费。
//!
//! # 设计说明
//!
//! 快照是网格和求解器状态的只读副本，在一次写入期间不可变：
//! - [`MeshSnapshot`]: 节点坐标、单元连接、逐节点体积
//! - [`StateSnapshot`]: 位移、速度、力密度、能量、张量等场数组
//!
//! 写入器绝不回写快照；派生场（Force、Neighbors 计数）在写入时
//! 由编排器即时计算，不在快照中持久化。

use serde::{Deserialize, Serialize};

use pd_foundation::{PdError, PdResult};

// ============================================================
// 单元类型
// ============================================================

/// 单元类型
///
/// 决定连接数组的分块宽度，并携带各格式的类型编号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// 2 节点线单元
    Line,
    /// 3 节点三角形
    Triangle,
    /// 4 节点四边形
    Quad,
    /// 4 节点四面体
    Tetrahedron,
}

impl ElementType {
    /// 每单元节点数
    pub fn nodes_per_element(&self) -> usize {
        match self {
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad => 4,
            Self::Tetrahedron => 4,
        }
    }

    /// VTK 单元类型编号
    pub fn vtk_id(&self) -> u8 {
        match self {
            Self::Line => 3,
            Self::Triangle => 5,
            Self::Quad => 9,
            Self::Tetrahedron => 10,
        }
    }

    /// GMSH 单元类型编号
    pub fn gmsh_id(&self) -> u32 {
        match self {
            Self::Line => 1,
            Self::Triangle => 2,
            Self::Quad => 3,
            Self::Tetrahedron => 4,
        }
    }
}

// ============================================================
// 网格快照
// ============================================================

/// 网格快照
///
/// 几何与拓扑的只读副本。连接数组为空时表示点云模式。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshSnapshot {
    /// 节点参考坐标
    pub node_coords: Vec<[f64; 3]>,
    /// 单元类型
    pub element_type: ElementType,
    /// 平铺的单元连接数组（按单元类型分块）
    pub connectivity: Vec<usize>,
    /// 逐节点体积
    pub nodal_volumes: Vec<f64>,
}

impl MeshSnapshot {
    /// 创建点云快照（无单元连接）
    pub fn point_cloud(node_coords: Vec<[f64; 3]>, nodal_volumes: Vec<f64>) -> Self {
        Self {
            node_coords,
            element_type: ElementType::Triangle,
            connectivity: Vec::new(),
            nodal_volumes,
        }
    }

    /// 创建带单元连接的快照
    pub fn with_elements(
        node_coords: Vec<[f64; 3]>,
        element_type: ElementType,
        connectivity: Vec<usize>,
        nodal_volumes: Vec<f64>,
    ) -> Self {
        Self {
            node_coords,
            element_type,
            connectivity,
            nodal_volumes,
        }
    }

    /// 节点数
    pub fn n_nodes(&self) -> usize {
        self.node_coords.len()
    }

    /// 单元数
    pub fn n_cells(&self) -> usize {
        let npe = self.element_type.nodes_per_element();
        self.connectivity.len() / npe
    }

    /// 是否包含单元连接
    pub fn has_elements(&self) -> bool {
        !self.connectivity.is_empty()
    }

    /// 验证数据一致性
    pub fn validate(&self) -> PdResult<()> {
        let npe = self.element_type.nodes_per_element();
        if self.connectivity.len() % npe != 0 {
            return Err(PdError::invalid_mesh(format!(
                "连接数组长度 {} 不是每单元节点数 {} 的整数倍",
                self.connectivity.len(),
                npe
            )));
        }
        for &idx in &self.connectivity {
            if idx >= self.n_nodes() {
                return Err(PdError::invalid_mesh(format!(
                    "节点索引 {} 越界 (节点数 {})",
                    idx,
                    self.n_nodes()
                )));
            }
        }
        PdError::check_size("nodal_volumes", self.n_nodes(), self.nodal_volumes.len())?;
        Ok(())
    }
}

// ============================================================
// 状态快照
// ============================================================

/// 状态快照
///
/// 求解器状态的只读副本。空数组表示求解器未跟踪该场，
/// 编排器对空场直接跳过，即使输出标签已启用。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// 逐节点位移
    pub displacement: Vec<[f64; 3]>,
    /// 逐节点速度
    pub velocity: Vec<[f64; 3]>,
    /// 逐节点力密度（未乘节点体积）
    pub force_density: Vec<[f64; 3]>,
    /// 逐节点应变能
    pub strain_energy: Vec<f64>,
    /// 逐节点固定标志
    pub fixity: Vec<u8>,
    /// 逐节点邻居列表
    pub neighbors: Vec<Vec<usize>>,
    /// 逐节点应变张量，分量顺序 [xx, yy, zz, xy, yz, xz]
    pub strain_tensor: Vec<[f64; 6]>,
    /// 逐节点应力张量，分量顺序同上
    pub stress_tensor: Vec<[f64; 6]>,
    /// 全局总能量（可选，作为全局标量输出）
    pub total_energy: Option<f64>,
}

impl StateSnapshot {
    /// 从主要场创建快照
    pub fn new(
        displacement: Vec<[f64; 3]>,
        velocity: Vec<[f64; 3]>,
        force_density: Vec<[f64; 3]>,
    ) -> Self {
        Self {
            displacement,
            velocity,
            force_density,
            ..Default::default()
        }
    }

    /// 添加应变能
    pub fn with_strain_energy(mut self, strain_energy: Vec<f64>) -> Self {
        self.strain_energy = strain_energy;
        self
    }

    /// 添加固定标志
    pub fn with_fixity(mut self, fixity: Vec<u8>) -> Self {
        self.fixity = fixity;
        self
    }

    /// 添加邻居列表
    pub fn with_neighbors(mut self, neighbors: Vec<Vec<usize>>) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// 添加应变/应力张量
    pub fn with_tensors(mut self, strain: Vec<[f64; 6]>, stress: Vec<[f64; 6]>) -> Self {
        self.strain_tensor = strain;
        self.stress_tensor = stress;
        self
    }

    /// 添加全局总能量
    pub fn with_total_energy(mut self, total_energy: f64) -> Self {
        self.total_energy = Some(total_energy);
        self
    }

    /// 验证非空场的长度与节点数一致
    pub fn validate(&self, n_nodes: usize) -> PdResult<()> {
        let check = |name: &str, len: usize| -> PdResult<()> {
            if len != 0 {
                PdError::check_size(name, n_nodes, len)?;
            }
            Ok(())
        };
        check("displacement", self.displacement.len())?;
        check("velocity", self.velocity.len())?;
        check("force_density", self.force_density.len())?;
        check("strain_energy", self.strain_energy.len())?;
        check("fixity", self.fixity.len())?;
        check("neighbors", self.neighbors.len())?;
        check("strain_tensor", self.strain_tensor.len())?;
        check("stress_tensor", self.stress_tensor.len())?;
        Ok(())
    }
}

// ============================================================
// 测试
// ============================================================
