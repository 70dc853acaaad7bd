// crates/fv_geo/src/lib.rs
//! ForestVTK 几何变换模块
//!
//! 导出时可选的坐标映射：将树顶点空间中的坐标映射到输出空间。
//!
//! # 模块
//!
//! - `transform`: [`GeometryTransform`] trait 及恒等、仿射和闭包实现
//!
//! # 示例
//!
//! ```
//! use fv_geo::prelude::*;
//! use fv_forest::TreeId;
//! use glam::DVec3;
//!
//! let affine = AffineTransform::scale(DVec3::new(2.0, 2.0, 1.0));
//! let p = affine.map(TreeId(0), DVec3::new(1.0, 0.5, 0.0));
//! assert_eq!(p, DVec3::new(2.0, 1.0, 0.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod transform;

/// 预导入模块
pub mod prelude {
    pub use crate::transform::{fn_transform, AffineTransform, FnTransform, GeometryTransform, Identity};
}

pub use transform::{fn_transform, AffineTransform, FnTransform, GeometryTransform, Identity};
