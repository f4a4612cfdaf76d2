// crates/pd_io/src/exporters/legacy_vtk.rs

//! 传统 ASCII VTK 格式后端
//!
//! 写出 `# vtk DataFile Version 2.0` 方言的 UNSTRUCTURED_GRID，
//! 供只认传统格式的老工具链消费。
//!
//! # 框架布局
//!
//! - 文件头 + `DATASET UNSTRUCTURED_GRID`
//! - `FIELD FieldData` 携带 `TIME` 与全局标量
//! - `POINTS` / `CELLS` / `CELL_TYPES`（点云模式省略单元段）
//! - `POINT_DATA` / `CELL_DATA` 下按追加顺序写 `SCALARS` / `VECTORS` / `TENSORS`
//!
//! 传统方言没有对称张量数组类型，`SymTensor3` 展开为完整 3×3 的
//! `TENSORS` 块；6 分量表示只在 `.vtu` 和 `.msh` 中保留。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pd_foundation::{FieldBuffer, FieldValues};

use crate::error::{IoError, IoResult};
use crate::exporters::{write_ascii_entry, FormatBackend, SnapshotBuffer};
use crate::snapshot::ElementType;

/// 传统 VTK 写入器
pub struct LegacyVtkWriter {
    out: Option<BufWriter<File>>,
    buf: SnapshotBuffer,
}

impl LegacyVtkWriter {
    /// 创建 `<filename>.vtk` 并截断已有文件
    pub fn create(filename: &Path, _compression: &str) -> IoResult<Self> {
        let path = filename.with_extension("vtk");
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

impl FormatBackend for LegacyVtkWriter {
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

impl Drop for LegacyVtkWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// 传统方言的标量类型名
fn scalar_type_name(values: &FieldValues) -> &'static str {
    match values {
        FieldValues::Float64(_) => "double",
        FieldValues::Float32(_) => "float",
        FieldValues::UInt8(_) => "unsigned_char",
        FieldValues::Int32(_) => "int",
        FieldValues::UInt64(_) => "unsigned_long",
        _ => "double",
    }
}

/// 渲染整个文件
pub(crate) fn render<W: Write>(buf: &SnapshotBuffer, w: &mut W) -> IoResult<()> {
    writeln!(w, "# vtk DataFile Version 2.0")?;
    writeln!(w, "PeriDyn simulation output")?;
    writeln!(w, "ASCII")?;
    writeln!(w, "DATASET UNSTRUCTURED_GRID")?;

    // 时间戳与全局标量
    let n_arrays = usize::from(buf.time.is_some()) + buf.field_data.len();
    if n_arrays > 0 {
        writeln!(w, "FIELD FieldData {}", n_arrays)?;
        if let Some(time) = buf.time {
            writeln!(w, "TIME 1 1 double")?;
            writeln!(w, "{}", time)?;
        }
        for (name, value) in &buf.field_data {
            writeln!(w, "{} 1 1 double", name)?;
            writeln!(w, "{}", value)?;
        }
    }

    // 点坐标
    writeln!(w, "POINTS {} double", buf.points.len())?;
    for p in &buf.points {
        writeln!(w, "{} {} {}", p[0], p[1], p[2])?;
    }

    // 单元段（点云模式省略）
    if let Some((et, conn)) = &buf.cells {
        let npe = et.nodes_per_element();
        let n_cells = buf.n_cells();
        writeln!(w, "CELLS {} {}", n_cells, n_cells * (npe + 1))?;
        for chunk in conn.chunks(npe) {
            let line: Vec<String> = chunk.iter().map(|n| n.to_string()).collect();
            writeln!(w, "{} {}", npe, line.join(" "))?;
        }
        writeln!(w, "CELL_TYPES {}", n_cells)?;
        for _ in 0..n_cells {
            writeln!(w, "{}", et.vtk_id())?;
        }
    }

    // 场数据
    if !buf.point_data.is_empty() {
        writeln!(w, "POINT_DATA {}", buf.points.len())?;
        write_attributes(w, &buf.point_data)?;
    }
    if !buf.cell_data.is_empty() {
        writeln!(w, "CELL_DATA {}", buf.n_cells())?;
        write_attributes(w, &buf.cell_data)?;
    }
    Ok(())
}

fn write_attributes<W: Write>(w: &mut W, fields: &[FieldBuffer]) -> IoResult<()> {
    use pd_foundation::FieldKind;

    for field in fields {
        match field.kind() {
            FieldKind::Scalar => {
                writeln!(
                    w,
                    "SCALARS {} {} 1",
                    field.name,
                    scalar_type_name(&field.values)
                )?;
                writeln!(w, "LOOKUP_TABLE default")?;
            }
            FieldKind::Vector3 => {
                writeln!(w, "VECTORS {} double", field.name)?;
            }
            FieldKind::SymTensor3 | FieldKind::Tensor3x3 => {
                writeln!(w, "TENSORS {} double", field.name)?;
            }
        }
        for i in 0..field.len() {
            write_ascii_entry(w, "", &field.values, i, true)?;
        }
    }
    Ok(())
}

// ============================================================
// 测试
// ============================================================
