// crates/fv_forest/src/quadrant.rs

//! 象限/卦限类型
//!
//! 单元由所属树、细分层级和树内整数坐标确定。整数坐标范围为
//! `[0, D::ROOT_LEN)`，2D 时 z 分量恒为 0。

use fv_foundation::Dimension;
use std::fmt;

/// 树编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TreeId(pub u32);

impl TreeId {
    /// 作为数组下标
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 森林单元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quadrant {
    /// 所属树
    pub tree: TreeId,
    /// 细分层级（0 为整棵树）
    pub level: u8,
    /// 树内整数坐标（左下角）
    pub coords: [i32; 3],
}

impl Quadrant {
    /// 创建单元
    pub fn new(tree: TreeId, level: u8, coords: [i32; 3]) -> Self {
        Self {
            tree,
            level,
            coords,
        }
    }

    /// z-order 角点的整数坐标
    ///
    /// 角点编号第 0/1/2 位分别表示 x/y/z 方向取上侧。
    #[inline]
    pub fn corner_coords<D: Dimension>(&self, corner: usize) -> [i32; 3] {
        let len = D::quadrant_len(self.level);
        let mut c = self.coords;
        for (axis, value) in c.iter_mut().enumerate().take(D::DIM) {
            if corner & (1 << axis) != 0 {
                *value += len;
            }
        }
        c
    }

    /// 单元在树参考空间 `[0, 1]^DIM` 中的中心
    pub fn center_reference<D: Dimension>(&self) -> [f64; 3] {
        let half = D::quadrant_len(self.level) as f64 * 0.5;
        let root = D::ROOT_LEN as f64;
        let mut center = [0.0; 3];
        for axis in 0..D::DIM {
            center[axis] = (self.coords[axis] as f64 + half) / root;
        }
        center
    }
}
