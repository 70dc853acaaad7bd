// crates/fv_forest/src/forest.rs

//! 森林本地分区视图
//!
//! [`ForestView`] 是导出层看到的全部森林信息：连接关系和按全局顺序排列的本地单元。
//! 导出调用只借用视图，从不修改或缓存它。
//!
//! [`LocalForest`] 是一个最小的实现，用于命令行工具和测试：
//! 均匀细分所有树，并按单元数均匀切分到各进程。

use crate::connectivity::Connectivity;
use crate::quadrant::{Quadrant, TreeId};
use fv_foundation::{Dimension, FvError, FvResult};

/// 森林本地分区的只读访问接口
pub trait ForestView {
    /// 维度标记
    type Dim: Dimension;

    /// 树连接关系
    fn connectivity(&self) -> &Connectivity<Self::Dim>;

    /// 本进程拥有的单元，按全局顺序排列
    fn local_quadrants(&self) -> &[Quadrant];

    /// 本地单元数量
    fn local_num_quadrants(&self) -> usize {
        self.local_quadrants().len()
    }
}

/// 简单的本地分区
#[derive(Debug, Clone)]
pub struct LocalForest<D: Dimension> {
    connectivity: Connectivity<D>,
    quadrants: Vec<Quadrant>,
    global_first: u64,
    global_count: u64,
}

impl<D: Dimension> LocalForest<D> {
    /// 由已分区的单元列表创建
    ///
    /// # Errors
    ///
    /// 单元的树编号越界或层级超过 `D::QMAX_LEVEL` 时返回错误。
    pub fn new(connectivity: Connectivity<D>, quadrants: Vec<Quadrant>) -> FvResult<Self> {
        let n_trees = connectivity.num_trees();
        for q in &quadrants {
            if q.tree.index() >= n_trees {
                return Err(FvError::invalid_input(format!(
                    "单元所属树 {} 超出范围 0..{n_trees}",
                    q.tree
                )));
            }
            if q.level > D::QMAX_LEVEL {
                return Err(FvError::invalid_input(format!(
                    "单元层级 {} 超过最大层级 {}",
                    q.level,
                    D::QMAX_LEVEL
                )));
            }
        }
        let count = quadrants.len() as u64;
        Ok(Self {
            connectivity,
            quadrants,
            global_first: 0,
            global_count: count,
        })
    }

    /// 均匀细分到 `level` 层，并取第 `rank` 个（共 `size` 个）分区
    ///
    /// 全局单元按树编号、再按树内 Morton 顺序排列；第 p 个分区包含
    /// `[N*p/size, N*(p+1)/size)` 区间内的单元。
    ///
    /// # Errors
    ///
    /// `size == 0`、`rank >= size`、层级过大或单元总数溢出时返回错误。
    pub fn uniform(
        connectivity: Connectivity<D>,
        level: u8,
        rank: usize,
        size: usize,
    ) -> FvResult<Self> {
        if size == 0 || rank >= size {
            return Err(FvError::invalid_input(format!(
                "进程编号 {rank} 不在 0..{size} 内"
            )));
        }
        if level > D::QMAX_LEVEL {
            return Err(FvError::invalid_input(format!(
                "层级 {level} 超过最大层级 {}",
                D::QMAX_LEVEL
            )));
        }

        let bits = D::DIM as u32 * u32::from(level);
        let per_tree = 1u64
            .checked_shl(bits)
            .filter(|_| bits < 63)
            .ok_or_else(|| FvError::invalid_input(format!("层级 {level} 的单元数溢出")))?;
        let global_count = per_tree
            .checked_mul(connectivity.num_trees() as u64)
            .ok_or_else(|| FvError::invalid_input("全局单元数溢出"))?;

        let first = partition_offset(global_count, rank, size);
        let last = partition_offset(global_count, rank + 1, size);
        let len = D::quadrant_len(level);

        let quadrants = (first..last)
            .map(|g| {
                let tree = TreeId((g / per_tree) as u32);
                let [x, y, z] = morton_decode::<D>(g % per_tree, level);
                Quadrant::new(tree, level, [x * len, y * len, z * len])
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "uniform {} forest: level {}, rank {}/{}, {} of {} quadrants",
            D::name(),
            level,
            rank,
            size,
            quadrants.len(),
            global_count
        );

        Ok(Self {
            connectivity,
            quadrants,
            global_first: first,
            global_count,
        })
    }

    /// 本分区第一个单元的全局编号
    pub fn global_first_quadrant(&self) -> u64 {
        self.global_first
    }

    /// 全局单元总数
    pub fn global_num_quadrants(&self) -> u64 {
        self.global_count
    }
}

impl<D: Dimension> ForestView for LocalForest<D> {
    type Dim = D;

    fn connectivity(&self) -> &Connectivity<D> {
        &self.connectivity
    }

    fn local_quadrants(&self) -> &[Quadrant] {
        &self.quadrants
    }
}

fn partition_offset(total: u64, rank: usize, size: usize) -> u64 {
    ((u128::from(total) * rank as u128) / size as u128) as u64
}

/// 将 Morton 编号拆分为各方向的单元下标
fn morton_decode<D: Dimension>(mut code: u64, level: u8) -> [i32; 3] {
    let mut idx = [0i32; 3];
    for bit in 0..level {
        for axis in 0..D::DIM {
            idx[axis] |= ((code & 1) as i32) << bit;
            code >>= 1;
        }
    }
    idx
}
