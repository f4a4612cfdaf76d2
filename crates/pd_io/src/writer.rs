// crates/pd_io/src/writer.rs

//! 多格式写入器门面
//!
//! 按格式名把调用分派到具体后端。未知格式不报错：所有操作退化为
//! 静默空操作，不创建任何文件，驱动层可以无条件调用输出而不必
//! 预先检查格式是否受支持。

use std::path::Path;

use pd_foundation::FieldValues;

use crate::error::IoResult;
use crate::exporters::{FormatBackend, LegacyVtkWriter, MshWriter, VtuWriter};
use crate::snapshot::ElementType;

/// 统一写入器
///
/// 一个实例对应一个输出文件。`open` 之后按需追加网格与场数据，
/// `close` 一次性落盘。
pub struct Writer {
    backend: Option<Box<dyn FormatBackend>>,
}

impl Writer {
    /// 创建未打开的写入器
    pub fn new() -> Self {
        Self { backend: None }
    }

    /// 打开输出文件并选择后端
    ///
    /// `filename` 不带扩展名，由后端按格式补全。未知的 `format`
    /// 保持无后端状态，后续调用全部为空操作。
    pub fn open(&mut self, filename: &Path, format: &str, compression: &str) -> IoResult<()> {
        self.backend = match format {
            "vtu" => Some(Box::new(VtuWriter::create(filename, compression)?)),
            "msh" => Some(Box::new(MshWriter::create(filename, compression)?)),
            "legacy_vtk" => Some(Box::new(LegacyVtkWriter::create(filename, compression)?)),
            _ => None,
        };
        Ok(())
    }

    /// 是否有已打开的后端
    pub fn is_active(&self) -> bool {
        self.backend.is_some()
    }

    /// 追加点云节点（可选施加位移得到变形位置）
    pub fn append_nodes(
        &mut self,
        nodes: &[[f64; 3]],
        displacement: Option<&[[f64; 3]]>,
    ) -> IoResult<()> {
        match &mut self.backend {
            Some(b) => b.append_nodes(nodes, displacement),
            None => Ok(()),
        }
    }

    /// 追加节点与单元连接
    pub fn append_mesh(
        &mut self,
        nodes: &[[f64; 3]],
        element_type: ElementType,
        connectivity: &[usize],
        displacement: Option<&[[f64; 3]]>,
    ) -> IoResult<()> {
        match &mut self.backend {
            Some(b) => b.append_mesh(nodes, element_type, connectivity, displacement),
            None => Ok(()),
        }
    }

    /// 追加逐节点场
    pub fn append_point_data(&mut self, name: &str, data: FieldValues) -> IoResult<()> {
        match &mut self.backend {
            Some(b) => b.append_point_data(name, data),
            None => Ok(()),
        }
    }

    /// 追加逐单元场
    pub fn append_cell_data(&mut self, name: &str, data: FieldValues) -> IoResult<()> {
        match &mut self.backend {
            Some(b) => b.append_cell_data(name, data),
            None => Ok(()),
        }
    }

    /// 记录当前文件的时间戳
    pub fn add_time_step(&mut self, time: f64) -> IoResult<()> {
        match &mut self.backend {
            Some(b) => b.add_time_step(time),
            None => Ok(()),
        }
    }

    /// 追加全局标量
    pub fn append_field_data(&mut self, name: &str, value: f64) -> IoResult<()> {
        match &mut self.backend {
            Some(b) => b.append_field_data(name, value),
            None => Ok(()),
        }
    }

    /// 渲染并落盘，重复调用安全
    pub fn close(&mut self) -> IoResult<()> {
        match &mut self.backend {
            Some(b) => b.close(),
            None => Ok(()),
        }
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_format_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_0");
        let mut w = Writer::new();
        w.open(&path, "hdf5", "").unwrap();
        assert!(!w.is_active());
        w.append_nodes(&[[0.0; 3]], None).unwrap();
        w.append_point_data("h", FieldValues::Float64(vec![1.0]))
            .unwrap();
        w.add_time_step(1.0).unwrap();
        w.close().unwrap();
        // 目录里不应出现任何文件
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_open_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_3");
        let mut w = Writer::new();
        w.open(&path, "vtu", "").unwrap();
        assert!(w.is_active());
        w.append_nodes(&[[0.0; 3]], None).unwrap();
        w.close().unwrap();
        assert!(dir.path().join("output_3.vtu").exists());
    }
}
