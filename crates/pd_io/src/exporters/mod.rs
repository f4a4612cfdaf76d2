// crates/pd_io/src/exporters/mod.rs

//! 格式后端
//!
//! 三种互不兼容的磁盘格式共享同一能力集 [`FormatBackend`]：
//!
//! - [`vtu::VtuWriter`]: VTK XML UnstructuredGrid（`.vtu`）
//! - [`legacy_vtk::LegacyVtkWriter`]: 传统 ASCII VTK（`.vtk`）
//! - [`msh::MshWriter`]: GMSH 2.2 ASCII（`.msh`）
//!
//! # 设计说明
//!
//! 三种格式的文件头都依赖只有在全部追加完成后才已知的总数
//! （点数 / 单元数 / 场数），因此后端在 `open` 时创建文件并在内存中
//! 暂存快照（[`SnapshotBuffer`]），`close()` 时一次性渲染落盘。
//! 追加顺序即落盘顺序。`close()` 幂等；关闭后继续追加报
//! [`IoError::Closed`]；未显式关闭的后端在 Drop 时落盘。

pub mod legacy_vtk;
pub mod msh;
pub mod vtu;

pub use legacy_vtk::LegacyVtkWriter;
pub use msh::MshWriter;
pub use vtu::VtuWriter;

use std::collections::HashSet;
use std::io::Write;

use pd_foundation::{Association, FieldBuffer, FieldValues};

use crate::error::{IoError, IoResult};
use crate::snapshot::ElementType;

/// 格式后端能力集
///
/// 每个后端独占一个打开的文件资源，生命周期从构造（open）到
/// `close()` 或 Drop 为止。
pub trait FormatBackend {
    /// 追加点云（变形后位置 = 参考坐标 + 位移）
    fn append_nodes(&mut self, nodes: &[[f64; 3]], displacement: Option<&[[f64; 3]]>)
        -> IoResult<()>;

    /// 追加完整网格拓扑
    fn append_mesh(
        &mut self,
        nodes: &[[f64; 3]],
        element_type: ElementType,
        connectivity: &[usize],
        displacement: Option<&[[f64; 3]]>,
    ) -> IoResult<()>;

    /// 追加一个逐节点场
    fn append_point_data(&mut self, name: &str, data: FieldValues) -> IoResult<()>;

    /// 追加一个逐单元场
    fn append_cell_data(&mut self, name: &str, data: FieldValues) -> IoResult<()>;

    /// 盖上本文件唯一的时间戳
    fn add_time_step(&mut self, time: f64) -> IoResult<()>;

    /// 追加一个全局（非逐实体）命名标量
    fn append_field_data(&mut self, name: &str, value: f64) -> IoResult<()>;

    /// 渲染并刷新文件；幂等
    fn close(&mut self) -> IoResult<()>;
}

// ============================================================
// 共享暂存缓冲
// ============================================================

/// 一次 open/close 周期内暂存的快照内容
///
/// 契约校验集中在暂存阶段：场名重复、长度不匹配、连接数组
/// 不是整数倍都在追加调用处报错，而不是等到 `close()`。
#[derive(Debug, Default)]
pub(crate) struct SnapshotBuffer {
    /// 变形后的节点位置
    pub points: Vec<[f64; 3]>,
    /// 单元连接（点云模式为 None）
    pub cells: Option<(ElementType, Vec<usize>)>,
    /// 逐节点场，按追加顺序
    pub point_data: Vec<FieldBuffer>,
    /// 逐单元场，按追加顺序
    pub cell_data: Vec<FieldBuffer>,
    /// 全局标量，按追加顺序
    pub field_data: Vec<(String, f64)>,
    /// 时间戳
    pub time: Option<f64>,
    /// 各段已使用的场名（逐节点 / 逐单元 / 全局各自独立，
    /// 三种格式都把它们写进不同的段，跨段同名不冲突）
    point_names: HashSet<String>,
    cell_names: HashSet<String>,
    global_names: HashSet<String>,
}

impl SnapshotBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 单元数
    pub(crate) fn n_cells(&self) -> usize {
        self.cells
            .as_ref()
            .map(|(et, conn)| conn.len() / et.nodes_per_element())
            .unwrap_or(0)
    }

    pub(crate) fn stage_nodes(
        &mut self,
        nodes: &[[f64; 3]],
        displacement: Option<&[[f64; 3]]>,
    ) -> IoResult<()> {
        self.points = deformed_positions(nodes, displacement)?;
        Ok(())
    }

    pub(crate) fn stage_mesh(
        &mut self,
        nodes: &[[f64; 3]],
        element_type: ElementType,
        connectivity: &[usize],
        displacement: Option<&[[f64; 3]]>,
    ) -> IoResult<()> {
        let npe = element_type.nodes_per_element();
        if connectivity.len() % npe != 0 {
            return Err(IoError::InvalidConnectivity {
                len: connectivity.len(),
                nodes_per_element: npe,
            });
        }
        self.points = deformed_positions(nodes, displacement)?;
        self.cells = Some((element_type, connectivity.to_vec()));
        Ok(())
    }

    pub(crate) fn stage_point_data(&mut self, name: &str, data: FieldValues) -> IoResult<()> {
        claim_name(&mut self.point_names, name)?;
        check_entity_count(name, self.points.len(), data.len())?;
        self.point_data
            .push(FieldBuffer::new(name, Association::PerNode, data));
        Ok(())
    }

    pub(crate) fn stage_cell_data(&mut self, name: &str, data: FieldValues) -> IoResult<()> {
        claim_name(&mut self.cell_names, name)?;
        check_entity_count(name, self.n_cells(), data.len())?;
        self.cell_data
            .push(FieldBuffer::new(name, Association::PerCell, data));
        Ok(())
    }

    pub(crate) fn stage_time(&mut self, time: f64) {
        self.time = Some(time);
    }

    pub(crate) fn stage_field_data(&mut self, name: &str, value: f64) -> IoResult<()> {
        claim_name(&mut self.global_names, name)?;
        self.field_data.push((name.to_string(), value));
        Ok(())
    }
}

/// 同一段内场名唯一，已有名不得覆盖
fn claim_name(names: &mut HashSet<String>, name: &str) -> IoResult<()> {
    if !names.insert(name.to_string()) {
        return Err(IoError::DuplicateField {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// 场长度必须等于网格实体数
fn check_entity_count(name: &str, expected: usize, actual: usize) -> IoResult<()> {
    if expected != actual {
        return Err(IoError::SizeMismatch {
            name: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// 计算变形后的节点位置
fn deformed_positions(
    nodes: &[[f64; 3]],
    displacement: Option<&[[f64; 3]]>,
) -> IoResult<Vec<[f64; 3]>> {
    match displacement {
        None => Ok(nodes.to_vec()),
        Some(u) => {
            if u.len() != nodes.len() {
                return Err(IoError::SizeMismatch {
                    name: "displacement".to_string(),
                    expected: nodes.len(),
                    actual: u.len(),
                });
            }
            Ok(nodes
                .iter()
                .zip(u)
                .map(|(x, du)| [x[0] + du[0], x[1] + du[1], x[2] + du[2]])
                .collect())
        }
    }
}

// ============================================================
// ASCII 渲染辅助
// ============================================================

/// 按变体原始数值类型写出第 i 个实体的一行分量
///
/// `expand_sym` 为 true 时对称张量展开为按行排列的 9 分量
/// （传统 VTK 和 GMSH 都没有 6 分量的对称张量表示）。
pub(crate) fn write_ascii_entry<W: Write>(
    w: &mut W,
    prefix: &str,
    values: &FieldValues,
    i: usize,
    expand_sym: bool,
) -> std::io::Result<()> {
    match values {
        FieldValues::Float64(v) => writeln!(w, "{prefix}{}", v[i]),
        FieldValues::Float32(v) => writeln!(w, "{prefix}{}", v[i]),
        FieldValues::UInt8(v) => writeln!(w, "{prefix}{}", v[i]),
        FieldValues::Int32(v) => writeln!(w, "{prefix}{}", v[i]),
        FieldValues::UInt64(v) => writeln!(w, "{prefix}{}", v[i]),
        FieldValues::Vector3(v) => {
            let p = &v[i];
            writeln!(w, "{prefix}{} {} {}", p[0], p[1], p[2])
        }
        FieldValues::SymTensor3(v) if expand_sym => {
            let t = &v[i];
            writeln!(
                w,
                "{prefix}{} {} {} {} {} {} {} {} {}",
                t[0], t[3], t[5], t[3], t[1], t[4], t[5], t[4], t[2]
            )
        }
        FieldValues::SymTensor3(v) => {
            let t = &v[i];
            writeln!(w, "{prefix}{} {} {} {} {} {}", t[0], t[1], t[2], t[3], t[4], t[5])
        }
        FieldValues::Tensor3x3(v) => {
            let t = &v[i];
            writeln!(
                w,
                "{prefix}{} {} {} {} {} {} {} {} {}",
                t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7], t[8]
            )
        }
    }
}

// ============================================================
// 测试
// ============================================================
