// crates/fv_io/src/lib.rs

//! ForestVTK IO 模块
//!
//! 将分布式自适应森林导出为 VTK XML 非结构网格：每个进程写出自己的分片
//! `<base>_<rank>.vtu`，协调进程写出引用全部分片的并行清单 `<base>.pvtu`。
//!
//! # 模块
//!
//! - [`extract`]: 几何提取（角点坐标、连接关系、节点重排）
//! - [`field`]: 数据字段描述
//! - [`vtu`]: 分片与清单写出器
//! - [`session`]: header → fields → footer 分步导出
//! - [`driver`]: 一次性导出入口
//! - [`config`]: 导出配置
//! - [`error`]: 错误类型
//!
//! # 使用示例
//!
//! ## 一次性导出（失败时终止进程）
//!
//! ```rust,ignore
//! use fv_io::write_file;
//!
//! write_file(&forest, None, "output/forest", &comm);
//! ```
//!
//! ## 分步导出
//!
//! ```rust,ignore
//! use fv_io::{ExportConfig, ExportSession, FieldDescriptor};
//!
//! let mut session = ExportSession::new(ExportConfig::default());
//! session.write_header(&forest, Some(&geometry), true, "output/forest", &comm)?;
//! session.write_field(&FieldDescriptor::cell_scalar("error", &indicator))?;
//! session.write_footer("output/forest", &comm)?;
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod field;
pub mod session;
pub mod vtu;

// 重导出常用类型
pub use config::{Encoding, ExportConfig, Precision};
pub use driver::{try_write_file, write_file};
pub use error::{IoError, IoResult};
pub use extract::{extract_geometry, PieceGeometry};
pub use field::{Association, FieldData, FieldDescriptor, FieldInfo, FieldKind, NumberType};
pub use session::{ExportSession, SessionState, LEVEL_FIELD, RANK_FIELD, TREE_FIELD};
pub use vtu::manifest::ManifestWriter;
pub use vtu::piece::{PieceSink, PieceWriter};
pub use vtu::{manifest_path, piece_path, visit_path};
