// crates/pd_io/tests/pipeline_output.rs

//! 快照输出编排的端到端测试

use pd_config::{ErrorScope, OutputConfig};
use pd_io::snapshot::{ElementType, MeshSnapshot, StateSnapshot};
use pd_io::OutputPipeline;

const ALL_TAGS: &[&str] = &[
    "Displacement",
    "Velocity",
    "Force",
    "Force_Density",
    "Strain_Energy",
    "Fixity",
    "Node_Volume",
    "Neighbors",
    "Strain_Tensor",
    "Stress_Tensor",
    "Total_Energy",
];

fn triangle_mesh() -> MeshSnapshot {
    MeshSnapshot::with_elements(
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]],
        ElementType::Triangle,
        vec![0, 1, 2],
        vec![0.25; 3],
    )
}

fn full_state() -> StateSnapshot {
    StateSnapshot::new(
        vec![[0.1, 0.0, 0.0]; 3],
        vec![[0.0, 0.2, 0.0]; 3],
        vec![[2.0, 4.0, 8.0]; 3],
    )
    .with_strain_energy(vec![0.5; 3])
    .with_fixity(vec![0, 1, 0])
    .with_neighbors(vec![vec![1, 2], vec![0], vec![0, 1]])
    .with_tensors(vec![[0.0; 6]; 3], vec![[0.0; 6]; 3])
    .with_total_energy(12.5)
}

fn config(dir: &std::path::Path, format: &str) -> OutputConfig {
    let mut config = OutputConfig::default();
    config.tags = ALL_TAGS.iter().map(|t| t.to_string()).collect();
    config.directory = dir.to_path_buf();
    config.format = format.to_string();
    config
}

#[test]
fn test_write_step_emits_fields_in_fixed_order() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = OutputPipeline::new(config(dir.path(), "vtu")).unwrap();
    pipeline
        .write_step(&triangle_mesh(), &full_state(), 0, 0.5, 100)
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("output_0.vtu")).unwrap();
    let order = [
        "Displacement",
        "Velocity",
        "\"Force\"",
        "Force_Density",
        "Strain_Energy",
        "Fixity",
        "Node_Volume",
        "Neighbors",
        "Strain_Tensor",
        "Stress_Tensor",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|name| text.find(name).unwrap_or_else(|| panic!("缺少场 {name}")))
        .collect();
    assert!(positions.windows(2).all(|p| p[0] < p[1]));

    // 节点力 = 力密度 × 节点体积
    assert!(text.contains("0.5 1 2"));
    // 邻居数
    assert!(text.contains(r#"type="UInt64" Name="Neighbors""#));
    assert!(text.contains(r#"Name="TimeValue""#));
    assert!(text.contains(r#"Name="Total_Energy""#));
    assert!(text.contains("12.5"));
}

#[test]
fn test_output_index_is_interval_quotient() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path(), "vtu");
    cfg.dt_out_criteria = 10;
    let pipeline = OutputPipeline::new(cfg).unwrap();
    pipeline
        .write_step(&triangle_mesh(), &full_state(), 30, 3.0, 100)
        .unwrap();
    assert!(dir.path().join("output_3.vtu").exists());
}

#[test]
fn test_point_cloud_when_fe_out_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path(), "legacy_vtk");
    cfg.perform_fe_out = false;
    let pipeline = OutputPipeline::new(cfg).unwrap();
    pipeline
        .write_step(&triangle_mesh(), &full_state(), 0, 0.0, 10)
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("output_0.vtk")).unwrap();
    assert!(!text.contains("CELLS"));
    assert!(text.contains("POINTS 3 double"));
}

#[test]
fn test_point_cloud_mesh_without_elements() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = OutputPipeline::new(config(dir.path(), "vtu")).unwrap();
    let mesh = MeshSnapshot::point_cloud(vec![[0.0; 3]; 3], vec![0.25; 3]);
    pipeline.write_step(&mesh, &full_state(), 0, 0.0, 10).unwrap();

    let text = std::fs::read_to_string(dir.path().join("output_0.vtu")).unwrap();
    assert!(text.contains(r#"NumberOfCells="0""#));
}

#[test]
fn test_disabled_tags_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path(), "vtu");
    cfg.tags = vec!["Displacement".to_string()];
    let pipeline = OutputPipeline::new(cfg).unwrap();
    pipeline
        .write_step(&triangle_mesh(), &full_state(), 0, 0.0, 10)
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("output_0.vtu")).unwrap();
    assert!(text.contains(r#"Name="Displacement""#));
    assert!(!text.contains(r#"Name="Velocity""#));
    assert!(!text.contains("Total_Energy"));
}

#[test]
fn test_unknown_format_degrades_to_noop() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = OutputPipeline::new(config(dir.path(), "hdf5")).unwrap();
    pipeline
        .write_step(&triangle_mesh(), &full_state(), 0, 0.0, 10)
        .unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_step_error_carries_configured_scope() {
    let dir = tempfile::tempdir().unwrap();
    // 目录位置被一个普通文件占住，打开输出文件必然失败
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, "x").unwrap();

    let mut cfg = config(&blocker, "vtu");
    cfg.error_scope = ErrorScope::Run;
    let pipeline = OutputPipeline::new(cfg).unwrap();
    let err = pipeline
        .write_step(&triangle_mesh(), &full_state(), 3, 0.3, 10)
        .unwrap_err();
    assert_eq!(err.step, 3);
    assert!(err.is_run_fatal());

    let mut cfg = config(&blocker, "vtu");
    cfg.error_scope = ErrorScope::File;
    let pipeline = OutputPipeline::new(cfg).unwrap();
    let err = pipeline
        .write_step(&triangle_mesh(), &full_state(), 3, 0.3, 10)
        .unwrap_err();
    assert!(!err.is_run_fatal());
}

#[test]
fn test_state_size_mismatch_fails_step() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = OutputPipeline::new(config(dir.path(), "vtu")).unwrap();
    let state = StateSnapshot::new(vec![[0.0; 3]; 2], vec![], vec![]);
    let err = pipeline
        .write_step(&triangle_mesh(), &state, 0, 0.0, 10)
        .unwrap_err();
    assert_eq!(err.step, 0);
}
