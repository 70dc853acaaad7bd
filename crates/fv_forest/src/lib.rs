// crates/fv_forest/src/lib.rs

//! ForestVTK 森林视图模块
//!
//! 自适应四叉树/八叉树森林的只读视图。森林本身（细分、平衡、分区）由调用方管理，
//! 本 crate 只描述导出所需的最小接口。
//!
//! # 核心类型
//!
//! - [`Quadrant`]: 单元（四叉树象限或八叉树卦限）
//! - [`Connectivity`]: 树的角点坐标表
//! - [`ForestView`]: 本地分区的只读访问接口
//! - [`LocalForest`]: 一个简单的本地分区实现，支持均匀细分和均匀分区
//!
//! # 示例
//!
//! ```
//! use fv_forest::{Connectivity, ForestView, LocalForest};
//! use fv_foundation::D2;
//!
//! let conn = Connectivity::<D2>::unit();
//! let forest = LocalForest::uniform(conn, 2, 0, 1).unwrap();
//! assert_eq!(forest.local_quadrants().len(), 16);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod forest;
pub mod quadrant;

pub use connectivity::Connectivity;
pub use forest::{ForestView, LocalForest};
pub use quadrant::{Quadrant, TreeId};
