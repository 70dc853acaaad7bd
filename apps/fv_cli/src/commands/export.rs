// apps/fv_cli/src/commands/export.rs

//! 导出命令
//!
//! 每个模拟进程构建自己的分区，然后按 header → fields → footer 写出。

use anyhow::{bail, Context, Result};
use clap::Args;
use fv_comm::{Communicator, LocalComm};
use fv_forest::{Connectivity, ForestView, LocalForest};
use fv_foundation::{Dimension, D2, D3};
use fv_geo::{AffineTransform, GeometryTransform};
use fv_io::{manifest_path, ExportConfig, ExportSession, FieldDescriptor, IoResult};
use glam::DVec3;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// 导出参数
#[derive(Args)]
pub struct ExportArgs {
    /// 空间维数 (2 或 3)
    #[arg(short, long, default_value_t = 2)]
    pub dim: u8,

    /// 各方向树数量
    #[arg(long, value_delimiter = ',', default_values_t = [1, 1, 1])]
    pub brick: Vec<usize>,

    /// 规则细分层级
    #[arg(short = 'L', long, default_value_t = 3)]
    pub level: u8,

    /// 模拟进程数
    #[arg(short = 'n', long, default_value_t = 1)]
    pub processes: usize,

    /// 输出基础文件名（可含目录）
    #[arg(short, long, default_value = "forest")]
    pub output: String,

    /// 导出配置文件 (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 坐标缩放系数
    #[arg(long)]
    pub stretch: Option<f64>,

    /// 绕 z 轴旋转角度（度）
    #[arg(long)]
    pub rotate: Option<f64>,

    /// 附加示例字段 `distance`（单元中心到原点的距离）
    #[arg(long)]
    pub with_fields: bool,
}

/// 执行导出命令
pub fn execute(args: ExportArgs) -> Result<()> {
    if args.processes == 0 {
        bail!("进程数必须大于 0");
    }
    let config = match &args.config {
        Some(path) => ExportConfig::from_json_file(path)
            .with_context(|| format!("无法加载配置 {}", path.display()))?,
        None => ExportConfig::default(),
    };
    let transform = build_transform(&args);

    info!(
        "导出 {}D 森林: 层级 {}, {} 个进程 -> {}",
        args.dim, args.level, args.processes, args.output
    );
    let start = Instant::now();
    let results = match args.dim {
        2 => run_export::<D2>(&args, &config, transform.as_ref()),
        3 => run_export::<D3>(&args, &config, transform.as_ref()),
        other => bail!("不支持的维数 {other}"),
    };

    let mut first_error = None;
    for (rank, result) in results.into_iter().enumerate() {
        if let Err(e) = result {
            warn!("进程 {rank}: {e}");
            first_error.get_or_insert((rank, e));
        }
    }
    if let Some((rank, e)) = first_error {
        return Err(e).with_context(|| format!("进程 {rank} 导出失败"));
    }

    info!(
        "完成: {} ({:.2?})",
        manifest_path(&args.output).display(),
        start.elapsed()
    );
    Ok(())
}

fn build_transform(args: &ExportArgs) -> Option<AffineTransform> {
    if args.stretch.is_none() && args.rotate.is_none() {
        return None;
    }
    let mut affine = AffineTransform::identity();
    if let Some(s) = args.stretch {
        affine = affine.then(&AffineTransform::scale(DVec3::splat(s)));
    }
    if let Some(deg) = args.rotate {
        affine = affine.then(&AffineTransform::rotation_z(deg.to_radians()));
    }
    Some(affine)
}

fn run_export<D: Dimension>(
    args: &ExportArgs,
    config: &ExportConfig,
    transform: Option<&AffineTransform>,
) -> Vec<Result<()>> {
    let mut dims = [1usize; 3];
    for (d, &n) in dims.iter_mut().zip(&args.brick) {
        *d = n;
    }

    LocalComm::run(args.processes, |comm| -> Result<()> {
        let forest = LocalForest::uniform(
            Connectivity::<D>::brick(dims),
            args.level,
            comm.rank(),
            comm.size(),
        )
        .context("构建森林失败");
        let forest = match forest {
            Ok(f) => f,
            Err(e) => {
                // 其余进程仍在等待表决
                ExportSession::new(config.clone()).abort(&comm)?;
                return Err(e);
            }
        };
        let transform = transform.map(|t| t as &dyn GeometryTransform);
        export_piece(&forest, transform, args, config, &comm).map_err(anyhow::Error::from)
    })
}

fn export_piece<D: Dimension>(
    forest: &LocalForest<D>,
    transform: Option<&dyn GeometryTransform>,
    args: &ExportArgs,
    config: &ExportConfig,
    comm: &LocalComm,
) -> IoResult<()> {
    let mut session = ExportSession::new(config.clone());
    if let Err(e) = session.write_header(forest, transform, true, &args.output, comm) {
        session.abort(comm)?;
        return Err(e);
    }

    if args.with_fields {
        let distance = center_distances(forest, transform);
        if let Err(e) = session.write_field(&FieldDescriptor::cell_scalar("distance", &distance)) {
            if !e.is_file_system_error() {
                session.abort(comm)?;
                return Err(e);
            }
        }
    }

    session.write_footer(&args.output, comm)
}

fn center_distances<D: Dimension>(
    forest: &LocalForest<D>,
    transform: Option<&dyn GeometryTransform>,
) -> Vec<f64> {
    let connectivity = forest.connectivity();
    forest
        .local_quadrants()
        .iter()
        .map(|q| {
            let Some(xyz) = connectivity.interpolate(q.tree, q.center_reference::<D>()) else {
                return f64::NAN;
            };
            let xyz = DVec3::from_array(xyz);
            let xyz = match transform {
                Some(t) => t.map(q.tree, xyz),
                None => xyz,
            };
            xyz.length()
        })
        .collect()
}
