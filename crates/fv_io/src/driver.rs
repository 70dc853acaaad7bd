// crates/fv_io/src/driver.rs

//! 一次性导出入口
//!
//! [`write_file`] 只写几何和 `mpirank` 字段，任何错误都终止进程：
//! 分布式数据集写到一半时继续运行只会留下误导性的可视化结果。
//! 需要自行决定失败策略的调用方使用 [`try_write_file`] 或 [`ExportSession`]。

use crate::config::ExportConfig;
use crate::error::IoResult;
use crate::session::ExportSession;
use fv_comm::Communicator;
use fv_forest::ForestView;
use fv_geo::GeometryTransform;

/// 写出网格和进程编号，失败时终止进程
///
/// 输出 `<base>_<rank>.vtu`，协调进程另外写出 `<base>.pvtu`。集体调用。
pub fn write_file<F, C>(forest: &F, transform: Option<&dyn GeometryTransform>, base: &str, comm: &C)
where
    F: ForestView + ?Sized,
    C: Communicator + ?Sized,
{
    if let Err(e) = try_write_file(forest, transform, base, comm, ExportConfig::default()) {
        tracing::error!("rank {}: VTK export {} failed: {}", comm.rank(), base, e);
        std::process::abort();
    }
}

/// [`write_file`] 的可恢复版本
///
/// 文件头失败时本进程投失败票，保证其他进程不会在收尾表决处阻塞。
pub fn try_write_file<F, C>(
    forest: &F,
    transform: Option<&dyn GeometryTransform>,
    base: &str,
    comm: &C,
    config: ExportConfig,
) -> IoResult<()>
where
    F: ForestView + ?Sized,
    C: Communicator + ?Sized,
{
    let mut session = ExportSession::new(config);
    match session.write_header(forest, transform, true, base, comm) {
        Ok(()) => session.write_footer(base, comm),
        Err(e) => {
            session.abort(comm)?;
            Err(e)
        }
    }
}
