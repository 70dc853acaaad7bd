// crates/fv_comm/src/lib.rs

//! ForestVTK 进程组模块
//!
//! 导出层只需要进程组的极少能力：查询编号与规模、同步、以及对成功/失败的集体表决。
//!
//! # 实现
//!
//! - [`SerialComm`]: 单进程
//! - [`LocalComm`]: 同一进程内用线程模拟的进程组，用于命令行工具和测试
//!
//! 真实的 MPI 绑定只需为其通信子实现 [`Communicator`]。
//!
//! # 示例
//!
//! ```
//! use fv_comm::{Communicator, LocalComm};
//!
//! let votes = LocalComm::run(4, |comm| comm.all_ok(comm.rank() != 2));
//! assert_eq!(votes, vec![false; 4]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod local;

pub use local::LocalComm;

/// 进程组接口
///
/// 集体操作（[`barrier`](Communicator::barrier)、[`all_ok`](Communicator::all_ok)）
/// 必须由组内每个进程以相同顺序调用。
pub trait Communicator {
    /// 本进程编号，范围 `0..size`
    fn rank(&self) -> usize;

    /// 进程总数
    fn size(&self) -> usize;

    /// 同步所有进程
    fn barrier(&self);

    /// 集体与运算：所有进程的 `ok` 都为真时返回真，每个进程得到相同结果
    fn all_ok(&self, ok: bool) -> bool;

    /// 是否为协调进程（0 号）
    fn is_coordinator(&self) -> bool {
        self.rank() == 0
    }
}

impl<C: Communicator + ?Sized> Communicator for &C {
    fn rank(&self) -> usize {
        (**self).rank()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn barrier(&self) {
        (**self).barrier()
    }

    fn all_ok(&self, ok: bool) -> bool {
        (**self).all_ok(ok)
    }
}

/// 单进程通信子
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn all_ok(&self, ok: bool) -> bool {
        ok
    }
}
