// crates/pd_io/src/exporters/vtu.rs

//! VTU 格式后端
//!
//! 写出 VTK XML UnstructuredGrid（ASCII），用于 ParaView 可视化。
//!
//! # 框架布局
//!
//! - `FieldData` 携带 `TimeValue` 时间戳与全局标量
//! - `Piece` 含 `Points` / `Cells`（connectivity、offsets、types）
//! - 逐节点场进 `PointData`，逐单元场进 `CellData`
//! - 点云模式写 `NumberOfCells="0"` 与空单元数组
//!
//! DataArray 的 `type` 属性反映 [`FieldValues`] 变体的原始数值类型，
//! 对称张量保留 6 分量表示（ParaView 按对称张量解释）。
//! 压缩类型参数仅在二进制路径有意义，ASCII 输出忽略。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pd_foundation::{FieldBuffer, FieldValues};

use crate::error::{IoError, IoResult};
use crate::exporters::{write_ascii_entry, FormatBackend, SnapshotBuffer};
use crate::snapshot::ElementType;

/// VTU 写入器
///
/// 在 `create` 时创建 `<filename>.vtu` 并暂存全部追加，
/// `close()` 时一次性渲染 XML。
pub struct VtuWriter {
    out: Option<BufWriter<File>>,
    buf: SnapshotBuffer,
}

impl VtuWriter {
    /// 创建 `<filename>.vtu` 并截断已有文件
    pub fn create(filename: &Path, _compression: &str) -> IoResult<Self> {
        let path = filename.with_extension("vtu");
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

impl FormatBackend for VtuWriter {
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

impl Drop for VtuWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// DataArray 的 type 属性
fn data_array_type(values: &FieldValues) -> &'static str {
    match values {
        FieldValues::Float64(_) => "Float64",
        FieldValues::Float32(_) => "Float32",
        FieldValues::UInt8(_) => "UInt8",
        FieldValues::Int32(_) => "Int32",
        FieldValues::UInt64(_) => "UInt64",
        FieldValues::Vector3(_) | FieldValues::SymTensor3(_) | FieldValues::Tensor3x3(_) => {
            "Float64"
        }
    }
}

/// 渲染整个 XML 文件
pub(crate) fn render<W: Write>(buf: &SnapshotBuffer, w: &mut W) -> IoResult<()> {
    let n_points = buf.points.len();
    let n_cells = buf.n_cells();

    writeln!(w, r#"<?xml version="1.0"?>"#)?;
    writeln!(
        w,
        r#"<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian">"#
    )?;
    writeln!(w, r#"  <UnstructuredGrid>"#)?;

    // 时间戳与全局标量
    if buf.time.is_some() || !buf.field_data.is_empty() {
        writeln!(w, r#"    <FieldData>"#)?;
        if let Some(time) = buf.time {
            writeln!(
                w,
                r#"      <DataArray type="Float64" Name="TimeValue" NumberOfTuples="1" format="ascii">"#
            )?;
            writeln!(w, "        {}", time)?;
            writeln!(w, r#"      </DataArray>"#)?;
        }
        for (name, value) in &buf.field_data {
            writeln!(
                w,
                r#"      <DataArray type="Float64" Name="{}" NumberOfTuples="1" format="ascii">"#,
                name
            )?;
            writeln!(w, "        {}", value)?;
            writeln!(w, r#"      </DataArray>"#)?;
        }
        writeln!(w, r#"    </FieldData>"#)?;
    }

    writeln!(
        w,
        r#"    <Piece NumberOfPoints="{}" NumberOfCells="{}">"#,
        n_points, n_cells
    )?;

    // 点坐标
    writeln!(w, r#"      <Points>"#)?;
    writeln!(
        w,
        r#"        <DataArray type="Float64" NumberOfComponents="3" format="ascii">"#
    )?;
    for p in &buf.points {
        writeln!(w, "          {} {} {}", p[0], p[1], p[2])?;
    }
    writeln!(w, r#"        </DataArray>"#)?;
    writeln!(w, r#"      </Points>"#)?;

    // 单元连接
    writeln!(w, r#"      <Cells>"#)?;
    writeln!(
        w,
        r#"        <DataArray type="Int32" Name="connectivity" format="ascii">"#
    )?;
    if let Some((et, conn)) = &buf.cells {
        for chunk in conn.chunks(et.nodes_per_element()) {
            let line: Vec<String> = chunk.iter().map(|n| n.to_string()).collect();
            writeln!(w, "          {}", line.join(" "))?;
        }
    }
    writeln!(w, r#"        </DataArray>"#)?;

    writeln!(
        w,
        r#"        <DataArray type="Int32" Name="offsets" format="ascii">"#
    )?;
    if let Some((et, _)) = &buf.cells {
        let npe = et.nodes_per_element();
        for i in 0..n_cells {
            writeln!(w, "          {}", (i + 1) * npe)?;
        }
    }
    writeln!(w, r#"        </DataArray>"#)?;

    writeln!(
        w,
        r#"        <DataArray type="UInt8" Name="types" format="ascii">"#
    )?;
    if let Some((et, _)) = &buf.cells {
        for _ in 0..n_cells {
            writeln!(w, "          {}", et.vtk_id())?;
        }
    }
    writeln!(w, r#"        </DataArray>"#)?;
    writeln!(w, r#"      </Cells>"#)?;

    // 场数据
    write_data_section(w, "PointData", &buf.point_data)?;
    write_data_section(w, "CellData", &buf.cell_data)?;

    writeln!(w, r#"    </Piece>"#)?;
    writeln!(w, r#"  </UnstructuredGrid>"#)?;
    writeln!(w, r#"</VTKFile>"#)?;
    Ok(())
}

fn write_data_section<W: Write>(w: &mut W, tag: &str, fields: &[FieldBuffer]) -> IoResult<()> {
    writeln!(w, "      <{}>", tag)?;
    for field in fields {
        let n_comp = field.values.n_components();
        if n_comp > 1 {
            writeln!(
                w,
                r#"        <DataArray type="{}" Name="{}" NumberOfComponents="{}" format="ascii">"#,
                data_array_type(&field.values),
                field.name,
                n_comp
            )?;
        } else {
            writeln!(
                w,
                r#"        <DataArray type="{}" Name="{}" format="ascii">"#,
                data_array_type(&field.values),
                field.name
            )?;
        }
        for i in 0..field.len() {
            write_ascii_entry(w, "          ", &field.values, i, false)?;
        }
        writeln!(w, r#"        </DataArray>"#)?;
    }
    writeln!(w, "      </{}>", tag)?;
    Ok(())
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn staged_triangle() -> SnapshotBuffer {
        let mut buf = SnapshotBuffer::new();
        buf.stage_mesh(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]],
            ElementType::Triangle,
            &[0, 1, 2],
            None,
        )
        .unwrap();
        buf.stage_point_data("h", FieldValues::Float64(vec![1.0, 2.0, 3.0]))
            .unwrap();
        buf.stage_time(0.5);
        buf
    }

    #[test]
    fn test_render_counts_and_time() {
        let buf = staged_triangle();
        let mut out = Vec::new();
        render(&buf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains(r#"<Piece NumberOfPoints="3" NumberOfCells="1">"#));
        assert!(text.contains(r#"Name="TimeValue""#));
        assert!(text.contains("        0.5"));
        assert!(text.contains(r#"<DataArray type="Float64" Name="h" format="ascii">"#));
    }

    #[test]
    fn test_render_point_cloud() {
        let mut buf = SnapshotBuffer::new();
        buf.stage_nodes(&[[0.0; 3]; 2], None).unwrap();
        let mut out = Vec::new();
        render(&buf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"NumberOfCells="0""#));
    }

    #[test]
    fn test_type_attribute_per_variant() {
        let mut buf = SnapshotBuffer::new();
        buf.stage_nodes(&[[0.0; 3]; 2], None).unwrap();
        buf.stage_point_data("Fixity", FieldValues::UInt8(vec![0, 1]))
            .unwrap();
        buf.stage_point_data("Neighbors", FieldValues::UInt64(vec![4, 6]))
            .unwrap();
        buf.stage_point_data(
            "Strain_Tensor",
            FieldValues::SymTensor3(vec![[0.0; 6]; 2]),
        )
        .unwrap();

        let mut out = Vec::new();
        render(&buf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"type="UInt8" Name="Fixity""#));
        assert!(text.contains(r#"type="UInt64" Name="Neighbors""#));
        assert!(text.contains(r#"Name="Strain_Tensor" NumberOfComponents="6""#));
    }
}
