// crates/fv_geo/src/transform.rs
//! 坐标变换
//!
//! 变换是纯函数：相同输入必须得到相同输出，且没有副作用。
//! 导出层对每个输出角点恰好调用一次 [`GeometryTransform::map`]，
//! 不检查返回值是否有限。

use fv_forest::TreeId;
use glam::{DMat3, DVec3};

/// 几何变换接口
pub trait GeometryTransform {
    /// 将树 `tree` 顶点空间中的点 `xyz` 映射到输出空间
    fn map(&self, tree: TreeId, xyz: DVec3) -> DVec3;
}

impl<T: GeometryTransform + ?Sized> GeometryTransform for &T {
    fn map(&self, tree: TreeId, xyz: DVec3) -> DVec3 {
        (**self).map(tree, xyz)
    }
}

impl<T: GeometryTransform + ?Sized> GeometryTransform for Box<T> {
    fn map(&self, tree: TreeId, xyz: DVec3) -> DVec3 {
        (**self).map(tree, xyz)
    }
}

/// 恒等变换
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl GeometryTransform for Identity {
    #[inline]
    fn map(&self, _tree: TreeId, xyz: DVec3) -> DVec3 {
        xyz
    }
}

// ============================================================================
// 仿射变换
// ============================================================================

/// 仿射变换 `x' = M x + t`，对所有树相同
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    /// 线性部分
    pub matrix: DMat3,
    /// 平移量
    pub offset: DVec3,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// 恒等变换
    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: DMat3::IDENTITY,
            offset: DVec3::ZERO,
        }
    }

    /// 创建平移变换
    #[must_use]
    pub fn translation(offset: DVec3) -> Self {
        Self {
            matrix: DMat3::IDENTITY,
            offset,
        }
    }

    /// 创建缩放变换
    #[must_use]
    pub fn scale(factors: DVec3) -> Self {
        Self {
            matrix: DMat3::from_diagonal(factors),
            offset: DVec3::ZERO,
        }
    }

    /// 绕 z 轴旋转（弧度，逆时针）
    #[must_use]
    pub fn rotation_z(angle: f64) -> Self {
        Self {
            matrix: DMat3::from_rotation_z(angle),
            offset: DVec3::ZERO,
        }
    }

    /// 先应用 `self` 再应用 `next`
    #[must_use]
    pub fn then(&self, next: &AffineTransform) -> Self {
        Self {
            matrix: next.matrix * self.matrix,
            offset: next.matrix * self.offset + next.offset,
        }
    }

    /// 应用正向变换
    #[inline]
    #[must_use]
    pub fn apply(&self, xyz: DVec3) -> DVec3 {
        self.matrix * xyz + self.offset
    }
}

impl GeometryTransform for AffineTransform {
    #[inline]
    fn map(&self, _tree: TreeId, xyz: DVec3) -> DVec3 {
        self.apply(xyz)
    }
}

// ============================================================================
// 闭包适配
// ============================================================================

/// 由闭包构造的变换
#[derive(Clone, Copy)]
pub struct FnTransform<F>(F);

/// 用闭包 `f(tree, xyz)` 构造变换
pub fn fn_transform<F>(f: F) -> FnTransform<F>
where
    F: Fn(TreeId, DVec3) -> DVec3,
{
    FnTransform(f)
}

impl<F> GeometryTransform for FnTransform<F>
where
    F: Fn(TreeId, DVec3) -> DVec3,
{
    #[inline]
    fn map(&self, tree: TreeId, xyz: DVec3) -> DVec3 {
        (self.0)(tree, xyz)
    }
}

impl<F> std::fmt::Debug for FnTransform<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnTransform")
    }
}
