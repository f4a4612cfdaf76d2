// crates/pd_io/src/exporters/msh.rs

//! GMSH 格式后端
//!
//! 写出 GMSH 2.2 ASCII 格式（`.msh`），节点与单元编号从 1 开始。
//!
//! # 框架布局
//!
//! - `$MeshFormat` 2.2 文件头
//! - `$Nodes` 写变形后的节点位置
//! - `$Elements` 写单元（点云模式写类型 15 的点单元，保证查看器可渲染）
//! - 每个逐节点场一个 `$NodeData` 块，每个逐单元场一个 `$ElementData` 块，
//!   实数标签携带文件时间戳
//! - 全局标量写入 `$FieldData` 自定义段（GMSH 读取器跳过未知段）
//!
//! GMSH 的场只支持 1/3/9 分量，对称张量展开为按行排列的 9 分量。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pd_foundation::{FieldBuffer, FieldKind, FieldValues};

use crate::error::{IoError, IoResult};
use crate::exporters::{write_ascii_entry, FormatBackend, SnapshotBuffer};
use crate::snapshot::ElementType;

/// GMSH 写入器
pub struct MshWriter {
    out: Option<BufWriter<File>>,
    buf: SnapshotBuffer,
}

impl MshWriter {
    /// 创建 `<filename>.msh` 并截断已有文件
    pub fn create(filename: &Path, _compression: &str) -> IoResult<Self> {
        let path = filename.with_extension("msh");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&path)?;
        Ok(Self {
            out: Some(BufWriter::new(file)),
            buf: SnapshotBuffer::new(),
        })
    }

    fn ensure_open(&self) -> IoResult<()> {
        if self.out.is_none() {
            return Err(IoError::Closed);
        }
        Ok(())
    }
}

impl FormatBackend for MshWriter {
    fn append_nodes(
        &mut self,
        nodes: &[[f64; 3]],
        displacement: Option<&[[f64; 3]]>,
    ) -> IoResult<()> {
        self.ensure_open()?;
        self.buf.stage_nodes(nodes, displacement)
    }

    fn append_mesh(
        &mut self,
        nodes: &[[f64; 3]],
        element_type: ElementType,
        connectivity: &[usize],
        displacement: Option<&[[f64; 3]]>,
    ) -> IoResult<()> {
        self.ensure_open()?;
        self.buf
            .stage_mesh(nodes, element_type, connectivity, displacement)
    }

    fn append_point_data(&mut self, name: &str, data: FieldValues) -> IoResult<()> {
        self.ensure_open()?;
        self.buf.stage_point_data(name, data)
    }

    fn append_cell_data(&mut self, name: &str, data: FieldValues) -> IoResult<()> {
        self.ensure_open()?;
        self.buf.stage_cell_data(name, data)
    }

    fn add_time_step(&mut self, time: f64) -> IoResult<()> {
        self.ensure_open()?;
        self.buf.stage_time(time);
        Ok(())
    }

    fn append_field_data(&mut self, name: &str, value: f64) -> IoResult<()> {
        self.ensure_open()?;
        self.buf.stage_field_data(name, value)
    }

    fn close(&mut self) -> IoResult<()> {
        let Some(mut out) = self.out.take() else {
            return Ok(());
        };
        render(&self.buf, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

impl Drop for MshWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// GMSH 场的分量数（只支持 1/3/9）
fn msh_components(kind: FieldKind) -> usize {
    match kind {
        FieldKind::Scalar => 1,
        FieldKind::Vector3 => 3,
        FieldKind::SymTensor3 | FieldKind::Tensor3x3 => 9,
    }
}

/// 渲染整个文件
pub(crate) fn render<W: Write>(buf: &SnapshotBuffer, w: &mut W) -> IoResult<()> {
    writeln!(w, "$MeshFormat")?;
    writeln!(w, "2.2 0 8")?;
    writeln!(w, "$EndMeshFormat")?;

    // 节点（1 基编号，变形后位置）
    writeln!(w, "$Nodes")?;
    writeln!(w, "{}", buf.points.len())?;
    for (i, p) in buf.points.iter().enumerate() {
        writeln!(w, "{} {} {} {}", i + 1, p[0], p[1], p[2])?;
    }
    writeln!(w, "$EndNodes")?;

    // 单元：网格模式写实际单元，点云模式写类型 15 的点单元
    writeln!(w, "$Elements")?;
    match &buf.cells {
        Some((et, conn)) => {
            let npe = et.nodes_per_element();
            writeln!(w, "{}", buf.n_cells())?;
            for (i, chunk) in conn.chunks(npe).enumerate() {
                write!(w, "{} {} 2 0 0", i + 1, et.gmsh_id())?;
                for n in chunk {
                    write!(w, " {}", n + 1)?;
                }
                writeln!(w)?;
            }
        }
        None => {
            writeln!(w, "{}", buf.points.len())?;
            for i in 0..buf.points.len() {
                writeln!(w, "{} 15 2 0 0 {}", i + 1, i + 1)?;
            }
        }
    }
    writeln!(w, "$EndElements")?;

    // 场数据
    let time = buf.time.unwrap_or(0.0);
    for field in &buf.point_data {
        write_data_block(w, "NodeData", field, time)?;
    }
    for field in &buf.cell_data {
        write_data_block(w, "ElementData", field, time)?;
    }

    // 全局标量：自定义段，GMSH 读取器跳过未知段
    if !buf.field_data.is_empty() {
        writeln!(w, "$FieldData")?;
        writeln!(w, "{}", buf.field_data.len())?;
        for (name, value) in &buf.field_data {
            writeln!(w, "\"{}\" {}", name, value)?;
        }
        writeln!(w, "$EndFieldData")?;
    }
    Ok(())
}

fn write_data_block<W: Write>(
    w: &mut W,
    section: &str,
    field: &FieldBuffer,
    time: f64,
) -> IoResult<()> {
    writeln!(w, "${}", section)?;
    // 1 个字符串标签（场名）
    writeln!(w, "1")?;
    writeln!(w, "\"{}\"", field.name)?;
    // 1 个实数标签（时间）
    writeln!(w, "1")?;
    writeln!(w, "{}", time)?;
    // 3 个整数标签：时间步号、分量数、实体数
    writeln!(w, "3")?;
    writeln!(w, "0")?;
    writeln!(w, "{}", msh_components(field.kind()))?;
    writeln!(w, "{}", field.len())?;
    for i in 0..field.len() {
        let prefix = format!("{} ", i + 1);
        write_ascii_entry(w, &prefix, &field.values, i, true)?;
    }
    writeln!(w, "$End{}", section)?;
    Ok(())
}

// ============================================================
// 测试
// ============================================================
