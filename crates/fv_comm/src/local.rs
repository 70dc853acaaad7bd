// crates/fv_comm/src/local.rs

//! 线程模拟的进程组
//!
//! 组内每个成员持有同一份共享状态；集体操作通过 `std::sync::Barrier` 对齐。

use crate::Communicator;
use parking_lot::Mutex;
use std::sync::{Arc, Barrier};

#[derive(Debug)]
struct Shared {
    size: usize,
    barrier: Barrier,
    failures: Mutex<usize>,
}

/// 线程模拟的进程组成员
#[derive(Debug, Clone)]
pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    /// 创建 `size` 个成员，第 i 个成员的编号为 i
    ///
    /// `size` 为 0 时按 1 处理。
    pub fn group(size: usize) -> Vec<LocalComm> {
        let size = size.max(1);
        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            failures: Mutex::new(0),
        });
        (0..size)
            .map(|rank| LocalComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// 每个成员在独立线程上运行 `f`，按编号顺序返回结果
    ///
    /// 任一线程 panic 时向调用方传播。
    pub fn run<T, F>(size: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(LocalComm) -> T + Sync,
    {
        let group = Self::group(size);
        let f = &f;
        std::thread::scope(|scope| {
            let handles = group
                .into_iter()
                .map(|comm| scope.spawn(move || f(comm)))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(value) => value,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }

    fn all_ok(&self, ok: bool) -> bool {
        if !ok {
            *self.shared.failures.lock() += 1;
        }
        // 第一轮：所有票已投出
        self.shared.barrier.wait();
        let result = *self.shared.failures.lock() == 0;
        // 第二轮：所有成员已读取结果，由 leader 清零
        if self.shared.barrier.wait().is_leader() {
            *self.shared.failures.lock() = 0;
        }
        // 第三轮：清零完成后才允许下一次表决
        self.shared.barrier.wait();
        if !result {
            tracing::trace!("rank {} observed failed vote", self.rank);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_ranks() {
        let group = LocalComm::group(3);
        let ranks: Vec<_> = group.iter().map(|c| c.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(group.iter().all(|c| c.size() == 3));
    }

    #[test]
    fn test_all_ok_unanimous() {
        let votes = LocalComm::run(4, |comm| comm.all_ok(true));
        assert_eq!(votes, vec![true; 4]);
    }

    #[test]
    fn test_all_ok_rounds_are_independent() {
        let votes = LocalComm::run(3, |comm| {
            let first = comm.all_ok(comm.rank() != 1);
            let second = comm.all_ok(true);
            (first, second)
        });
        assert!(votes.iter().all(|&(first, second)| !first && second));
    }

    #[test]
    fn test_run_returns_in_rank_order() {
        let ranks = LocalComm::run(5, |comm| {
            comm.barrier();
            comm.rank()
        });
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    }
}
