// crates/fv_foundation/src/dimension.rs

//! 编译期维度系统
//!
//! 通过类型参数区分四叉树 (2D) 和八叉树 (3D)，实现零成本抽象。
//!
//! # 用法
//!
//! ```
//! use fv_foundation::dimension::{Dimension, D2};
//!
//! fn corners_of<D: Dimension>(n_cells: usize) -> usize {
//!     n_cells * D::CORNERS
//! }
//!
//! assert_eq!(corners_of::<D2>(3), 12);
//! ```
//!
//! # 角点编号
//!
//! 森林内部使用 z-order（位交错）角点编号：第 0 位对应 x，第 1 位对应 y，
//! 第 2 位对应 z。VTK 的 QUAD/HEXAHEDRON 单元按逆时针环绕编号，
//! 两者之间的置换表固定不变，由 [`Dimension::VTK_NODE_ORDER`] 给出。

/// VTK_QUAD 单元类型代码
pub const VTK_QUAD: u8 = 9;

/// VTK_HEXAHEDRON 单元类型代码
pub const VTK_HEXAHEDRON: u8 = 12;

/// 维度 trait
///
/// 所有维度标记类型必须实现此 trait。
pub trait Dimension: 'static + Copy + Clone + Default + Send + Sync + std::fmt::Debug {
    /// 空间维数
    const DIM: usize;

    /// 每个单元的角点数 (2^DIM)
    const CORNERS: usize = 1 << Self::DIM;

    /// 根单元长度的二进制指数
    const MAX_LEVEL: u8;

    /// 单元允许的最大细分层级
    const QMAX_LEVEL: u8 = Self::MAX_LEVEL - 1;

    /// 根单元的整数长度
    const ROOT_LEN: i32 = 1 << Self::MAX_LEVEL;

    /// VTK 单元类型代码
    const VTK_CELL_TYPE: u8;

    /// VTK 局部节点 j 对应的 z-order 角点编号
    const VTK_NODE_ORDER: &'static [usize];

    /// 维度名称（用于日志和调试）
    fn name() -> &'static str;

    /// 给定层级的单元整数边长
    #[inline]
    fn quadrant_len(level: u8) -> i32 {
        1 << (Self::MAX_LEVEL - level)
    }
}

/// 2D 维度标记（四叉树）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct D2;

impl Dimension for D2 {
    const DIM: usize = 2;
    const MAX_LEVEL: u8 = 30;
    const VTK_CELL_TYPE: u8 = VTK_QUAD;
    const VTK_NODE_ORDER: &'static [usize] = &[0, 1, 3, 2];

    fn name() -> &'static str {
        "2D"
    }
}

/// 3D 维度标记（八叉树）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct D3;

impl Dimension for D3 {
    const DIM: usize = 3;
    const MAX_LEVEL: u8 = 19;
    const VTK_CELL_TYPE: u8 = VTK_HEXAHEDRON;
    const VTK_NODE_ORDER: &'static [usize] = &[0, 1, 3, 2, 4, 5, 7, 6];

    fn name() -> &'static str {
        "3D"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_counts() {
        assert_eq!(D2::CORNERS, 4);
        assert_eq!(D3::CORNERS, 8);
        assert_eq!(D2::VTK_NODE_ORDER.len(), D2::CORNERS);
        assert_eq!(D3::VTK_NODE_ORDER.len(), D3::CORNERS);
    }

    #[test]
    fn test_root_len() {
        assert_eq!(D2::ROOT_LEN, 1 << 30);
        assert_eq!(D3::ROOT_LEN, 1 << 19);
        assert_eq!(D2::quadrant_len(0), D2::ROOT_LEN);
        assert_eq!(D3::quadrant_len(2), D3::ROOT_LEN / 4);
        assert_eq!(D2::QMAX_LEVEL, 29);
    }

    /// 置换表必须是排列，且相邻 VTK 节点只相差一个坐标方向
    #[test]
    fn test_node_order_is_ring() {
        fn check<D: Dimension>() {
            let mut seen = vec![false; D::CORNERS];
            for &c in D::VTK_NODE_ORDER {
                assert!(!seen[c]);
                seen[c] = true;
            }
            // 底面（和 3D 顶面）四个节点依次相邻
            for face in D::VTK_NODE_ORDER.chunks(4) {
                for j in 0..4 {
                    let a = face[j];
                    let b = face[(j + 1) % 4];
                    assert_eq!((a ^ b).count_ones(), 1, "{} 节点 {a}->{b}", D::name());
                }
            }
        }
        check::<D2>();
        check::<D3>();
    }

    #[test]
    fn test_cell_types() {
        assert_eq!(D2::VTK_CELL_TYPE, 9);
        assert_eq!(D3::VTK_CELL_TYPE, 12);
    }
}
