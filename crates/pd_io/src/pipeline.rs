// crates/pd_io/src/pipeline.rs

//! 快照输出编排
//!
//! 把一次时间步的网格与状态快照按固定的场顺序送入 [`Writer`]：
//! 打开 `output_<序号>` 文件、按输出策略筛选场、盖时间戳、关闭落盘，
//! 并在控制台打印步号与完成百分比进度行。

use std::path::PathBuf;

use pd_config::{ErrorScope, OutputConfig};
use pd_foundation::FieldValues;
use tracing::debug;

use crate::error::IoError;
use crate::snapshot::{MeshSnapshot, StateSnapshot};
use crate::writer::Writer;

/// 单次快照输出失败
///
/// 携带配置的中止范围，驱动层据此决定是跳过本文件还是终止整个
/// 模拟运行。
#[derive(Debug, thiserror::Error)]
#[error("第 {step} 步输出失败: {source}")]
pub struct StepError {
    /// 失败的时间步号
    pub step: usize,
    /// 配置的中止范围
    pub scope: ErrorScope,
    #[source]
    source: IoError,
}

impl StepError {
    /// 是否应终止整个运行
    pub fn is_run_fatal(&self) -> bool {
        matches!(self.scope, ErrorScope::Run)
    }

    /// 底层 IO 错误
    pub fn source_error(&self) -> &IoError {
        &self.source
    }
}

/// 每 10% 进度打印一次时的完成百分比
///
/// 仅当 `step` 落在间隔点且百分比非零时返回值；`total_steps` 为 0
/// 时无法定义进度，返回 `None`。
pub fn completion_percent(step: usize, total_steps: usize) -> Option<u32> {
    if total_steps == 0 {
        return None;
    }
    let interval = (total_steps / 10).max(1);
    let percent = (step as f64 * 100.0 / total_steps as f64) as u32;
    if step % interval == 0 && percent > 0 {
        Some(percent)
    } else {
        None
    }
}

/// 快照输出编排器
pub struct OutputPipeline {
    config: OutputConfig,
}

impl OutputPipeline {
    /// 用校验过的输出策略构造编排器
    pub fn new(config: OutputConfig) -> Result<Self, pd_config::ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 输出策略
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// 第 `step` 步的输出文件路径（不带扩展名）
    ///
    /// 文件序号是步号对输出间隔的整除商，保证序号连续。
    pub fn output_path(&self, step: usize) -> PathBuf {
        self.config
            .directory
            .join(format!("output_{}", step / self.config.dt_out_criteria))
    }

    /// 写出一次时间步快照
    ///
    /// 先打印步号与进度行，再打开文件、按固定顺序追加场、关闭落盘。
    /// 未知格式下 [`Writer`] 全程空操作，本函数仍正常返回。
    pub fn write_step(
        &self,
        mesh: &MeshSnapshot,
        state: &StateSnapshot,
        step: usize,
        time: f64,
        total_steps: usize,
    ) -> Result<(), StepError> {
        println!("Output: time step = {}", step);
        if let Some(percent) = completion_percent(step, total_steps) {
            println!("Message: Simulation {}% complete.", percent);
        }

        self.emit(mesh, state, step, time).map_err(|source| StepError {
            step,
            scope: self.config.error_scope,
            source,
        })
    }

    fn emit(
        &self,
        mesh: &MeshSnapshot,
        state: &StateSnapshot,
        step: usize,
        time: f64,
    ) -> Result<(), IoError> {
        mesh.validate()?;
        state.validate(mesh.n_nodes())?;

        let path = self.output_path(step);
        debug!("写输出文件: {}", path.display());

        let mut writer = Writer::new();
        writer.open(&path, &self.config.format, &self.config.compression)?;

        let displacement = if state.displacement.is_empty() {
            None
        } else {
            Some(state.displacement.as_slice())
        };
        if mesh.has_elements() && self.config.perform_fe_out {
            writer.append_mesh(
                &mesh.node_coords,
                mesh.element_type,
                &mesh.connectivity,
                displacement,
            )?;
        } else {
            writer.append_nodes(&mesh.node_coords, displacement)?;
        }

        if self.tag_on("Displacement") && !state.displacement.is_empty() {
            writer.append_point_data(
                "Displacement",
                FieldValues::Vector3(state.displacement.clone()),
            )?;
        }
        if self.tag_on("Velocity") && !state.velocity.is_empty() {
            writer.append_point_data("Velocity", FieldValues::Vector3(state.velocity.clone()))?;
        }
        if self.tag_on("Force") && !state.force_density.is_empty() {
            // 节点力 = 力密度 × 节点体积
            let force: Vec<[f64; 3]> = state
                .force_density
                .iter()
                .zip(&mesh.nodal_volumes)
                .map(|(fd, v)| [fd[0] * v, fd[1] * v, fd[2] * v])
                .collect();
            writer.append_point_data("Force", FieldValues::Vector3(force))?;
        }

        writer.add_time_step(time)?;

        if self.tag_on("Force_Density") && !state.force_density.is_empty() {
            writer.append_point_data(
                "Force_Density",
                FieldValues::Vector3(state.force_density.clone()),
            )?;
        }
        if self.tag_on("Strain_Energy") && !state.strain_energy.is_empty() {
            writer.append_point_data(
                "Strain_Energy",
                FieldValues::Float64(state.strain_energy.clone()),
            )?;
        }
        if self.tag_on("Fixity") && !state.fixity.is_empty() {
            writer.append_point_data("Fixity", FieldValues::UInt8(state.fixity.clone()))?;
        }
        if self.tag_on("Node_Volume") && !mesh.nodal_volumes.is_empty() {
            writer.append_point_data(
                "Node_Volume",
                FieldValues::Float64(mesh.nodal_volumes.clone()),
            )?;
        }
        if self.tag_on("Neighbors") && !state.neighbors.is_empty() {
            let counts: Vec<u64> = state.neighbors.iter().map(|n| n.len() as u64).collect();
            writer.append_point_data("Neighbors", FieldValues::UInt64(counts))?;
        }
        if self.tag_on("Strain_Tensor") && !state.strain_tensor.is_empty() {
            writer.append_point_data(
                "Strain_Tensor",
                FieldValues::SymTensor3(state.strain_tensor.clone()),
            )?;
        }
        if self.tag_on("Stress_Tensor") && !state.stress_tensor.is_empty() {
            writer.append_point_data(
                "Stress_Tensor",
                FieldValues::SymTensor3(state.stress_tensor.clone()),
            )?;
        }

        if self.tag_on("Total_Energy") {
            if let Some(total) = state.total_energy {
                writer.append_field_data("Total_Energy", total)?;
            }
        }

        writer.close()
    }

    fn tag_on(&self, tag: &str) -> bool {
        self.config.is_tag_in_output(tag)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_percent_intervals() {
        // 95 步：间隔 9
        assert_eq!(completion_percent(0, 95), None);
        assert_eq!(completion_percent(9, 95), Some(9));
        assert_eq!(completion_percent(10, 95), None);
        assert_eq!(completion_percent(90, 95), Some(94));
    }

    #[test]
    fn test_completion_percent_short_run() {
        // 少于 10 步时间隔退化为 1，每个非零步都打印
        for step in 1..=5 {
            assert_eq!(completion_percent(step, 5), Some((step * 20) as u32));
        }
        assert_eq!(completion_percent(0, 5), None);
    }

    #[test]
    fn test_completion_percent_zero_total() {
        assert_eq!(completion_percent(3, 0), None);
    }

    #[test]
    fn test_output_path_uses_interval_quotient() {
        let mut config = OutputConfig::default();
        config.directory = PathBuf::from("/tmp/out");
        config.dt_out_criteria = 10;
        let pipeline = OutputPipeline::new(config).unwrap();
        assert_eq!(pipeline.output_path(0), PathBuf::from("/tmp/out/output_0"));
        assert_eq!(pipeline.output_path(30), PathBuf::from("/tmp/out/output_3"));
    }
}
