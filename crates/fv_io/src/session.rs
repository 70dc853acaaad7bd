// crates/fv_io/src/session.rs

//! 导出会话
//!
//! 分步写出协议：
//!
//! ```text
//! Uninitialized --write_header--> HeaderWritten --write_field*--> HeaderWritten
//!       |                              |  (文件系统错误)
//!       |                              v
//!       |                           Failed
//!       |                              |
//!       +---------write_footer / abort-+--> Closed
//! ```
//!
//! - `write_header` 失败时会话保持 `Uninitialized`，调用方可以换一个路径重试
//! - 协议错误在违规调用处同步返回，不改变会话状态，也不触碰文件
//! - `write_footer` 通过基础文件名校验后是集体操作：所有进程表决分片是否成功，
//!   全部成功时协调进程写出清单，再表决一次清单结果，各进程得到一致的结论
//!
//! # 示例
//!
//! ```no_run
//! use fv_comm::SerialComm;
//! use fv_forest::{Connectivity, LocalForest};
//! use fv_foundation::D2;
//! use fv_io::{ExportConfig, ExportSession, FieldDescriptor};
//!
//! let forest = LocalForest::uniform(Connectivity::<D2>::unit(), 3, 0, 1)?;
//! let depth = vec![1.0; 64];
//!
//! let mut session = ExportSession::new(ExportConfig::default());
//! session.write_header(&forest, None, true, "output/forest", &SerialComm)?;
//! session.write_field(&FieldDescriptor::cell_scalar("depth", &depth))?;
//! session.write_footer("output/forest", &SerialComm)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::ExportConfig;
use crate::error::{IoError, IoResult};
use crate::extract::extract_geometry;
use crate::field::{is_valid_name, FieldDescriptor, FieldInfo};
use crate::vtu::manifest::ManifestWriter;
use crate::vtu::piece::{PieceSink, PieceWriter};
use crate::vtu::{check_base_name, piece_path};
use fv_comm::Communicator;
use fv_forest::ForestView;
use fv_geo::GeometryTransform;
use std::path::{Path, PathBuf};

/// 进程编号字段名
pub const RANK_FIELD: &str = "mpirank";

/// 树编号字段名
pub const TREE_FIELD: &str = "treeid";

/// 细分层级字段名
pub const LEVEL_FIELD: &str = "level";

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 尚未写入文件头
    Uninitialized,
    /// 文件头已写入，可追加字段
    HeaderWritten,
    /// 写字段时发生文件系统错误，只能收尾
    Failed,
    /// 已收尾
    Closed,
}

/// 一次导出的可变状态
#[derive(Debug)]
pub struct ExportSession {
    config: ExportConfig,
    state: SessionState,
    base: String,
    rank: usize,
    size: usize,
    piece: Option<PieceWriter<PieceSink>>,
    piece_path: Option<PathBuf>,
    schema: Vec<FieldInfo>,
}

impl ExportSession {
    /// 创建未初始化的会话
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
            base: String::new(),
            rank: 0,
            size: 1,
            piece: None,
            piece_path: None,
            schema: Vec::new(),
        }
    }

    /// 当前状态
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 导出配置
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// 已写出字段（含内置字段），按写出顺序
    pub fn schema(&self) -> &[FieldInfo] {
        &self.schema
    }

    /// 已写出字段数
    pub fn fields_written(&self) -> usize {
        self.schema.len()
    }

    /// 本进程分片路径（header 之后可用）
    pub fn piece_path(&self) -> Option<&Path> {
        self.piece_path.as_deref()
    }

    /// 写出文件头：打开分片，写出几何和内置字段
    ///
    /// `write_rank` 为真时立即写出单元字段 `mpirank`；配置启用时继续写出
    /// `treeid` 和 `level`。
    ///
    /// # Errors
    ///
    /// 会话不处于 `Uninitialized`、基础文件名或配置无效、文件无法创建或写入时返回错误。
    pub fn write_header<F, C>(
        &mut self,
        forest: &F,
        transform: Option<&dyn GeometryTransform>,
        write_rank: bool,
        base: &str,
        comm: &C,
    ) -> IoResult<()>
    where
        F: ForestView + ?Sized,
        C: Communicator + ?Sized,
    {
        match self.state {
            SessionState::Uninitialized => {}
            SessionState::Closed => {
                return Err(IoError::SessionClosed {
                    operation: "write_header",
                })
            }
            SessionState::HeaderWritten | SessionState::Failed => {
                return Err(IoError::HeaderAlreadyWritten {
                    base: self.base.clone(),
                })
            }
        }
        self.config.validate()?;
        check_base_name(base)?;

        let rank = comm.rank();
        let path = piece_path(base, rank);
        let geometry = extract_geometry(forest, transform, self.config.scale)?;
        let piece = PieceWriter::create(&path, &self.config, &geometry)?.into_sink();

        self.base = base.to_string();
        self.rank = rank;
        self.size = comm.size();
        self.piece = Some(piece);
        self.piece_path = Some(path);
        self.schema.clear();
        self.state = SessionState::HeaderWritten;

        if let Err(e) = self.write_builtin_fields(forest, write_rank) {
            self.reset();
            return Err(e);
        }
        Ok(())
    }

    fn write_builtin_fields<F>(&mut self, forest: &F, write_rank: bool) -> IoResult<()>
    where
        F: ForestView + ?Sized,
    {
        let quadrants = forest.local_quadrants();
        if write_rank {
            let value = self.config.rank_value(self.rank) as i32;
            let ranks = vec![value; quadrants.len()];
            self.write_field(&FieldDescriptor::cell_int(RANK_FIELD, &ranks))?;
        }
        if self.config.write_tree {
            let trees: Vec<i32> = quadrants.iter().map(|q| q.tree.0 as i32).collect();
            self.write_field(&FieldDescriptor::cell_int(TREE_FIELD, &trees))?;
        }
        if self.config.write_level {
            let levels: Vec<i32> = quadrants.iter().map(|q| i32::from(q.level)).collect();
            self.write_field(&FieldDescriptor::cell_int(LEVEL_FIELD, &levels))?;
        }
        Ok(())
    }

    /// 追加一个具名字段
    ///
    /// # Errors
    ///
    /// 会话状态不对、字段名无效或重复、长度不匹配、数据段已关闭、写入失败时返回错误。
    pub fn write_field(&mut self, field: &FieldDescriptor<'_>) -> IoResult<()> {
        match self.state {
            SessionState::HeaderWritten => {}
            SessionState::Uninitialized => {
                return Err(IoError::HeaderNotWritten {
                    operation: "write_field",
                })
            }
            SessionState::Closed => {
                return Err(IoError::SessionClosed {
                    operation: "write_field",
                })
            }
            SessionState::Failed => {
                return Err(IoError::PieceAborted {
                    path: self.piece_path.clone().unwrap_or_default(),
                })
            }
        }
        if !is_valid_name(field.name) {
            return Err(IoError::InvalidFieldName {
                name: field.name.to_string(),
            });
        }
        if self.schema.iter().any(|f| f.name == field.name) {
            return Err(IoError::DuplicateField {
                name: field.name.to_string(),
            });
        }
        let Some(piece) = self.piece.as_mut() else {
            return Err(IoError::HeaderNotWritten {
                operation: "write_field",
            });
        };

        match piece.write_field(field) {
            Ok(()) => {
                tracing::trace!("rank {} wrote field {}", self.rank, field.name);
                self.schema.push(field.info());
                Ok(())
            }
            Err(e) => {
                if e.is_file_system_error() {
                    self.state = SessionState::Failed;
                    self.piece = None;
                }
                Err(e)
            }
        }
    }

    /// 写出文件尾并关闭分片；全部进程成功后由协调进程写出并行清单
    ///
    /// 基础文件名与 header 不一致时立即返回错误且不改变状态，不参与集体表决。
    /// 通过校验后所有进程必须各调用一次。
    ///
    /// # Errors
    ///
    /// 协议错误、本进程写入失败，或其他进程失败（[`IoError::PeerFailed`]）时返回错误。
    pub fn write_footer<C>(&mut self, base: &str, comm: &C) -> IoResult<()>
    where
        C: Communicator + ?Sized,
    {
        match self.state {
            SessionState::HeaderWritten | SessionState::Failed => {}
            SessionState::Uninitialized => {
                return Err(IoError::HeaderNotWritten {
                    operation: "write_footer",
                })
            }
            SessionState::Closed => {
                return Err(IoError::SessionClosed {
                    operation: "write_footer",
                })
            }
        }
        if base != self.base {
            return Err(IoError::BaseNameMismatch {
                expected: self.base.clone(),
                actual: base.to_string(),
            });
        }

        let local = match (self.state, self.piece.take()) {
            (SessionState::HeaderWritten, Some(piece)) => piece.finish().map(|_| ()),
            _ => Err(IoError::PieceAborted {
                path: self.piece_path.clone().unwrap_or_default(),
            }),
        };
        self.state = SessionState::Closed;
        self.finish_collective(local, comm)
    }

    /// 放弃本次导出
    ///
    /// 集体操作：本进程投失败票，使其他进程的 `write_footer` 返回
    /// [`IoError::PeerFailed`]。已写出的分片内容保留在磁盘上。
    pub fn abort<C>(&mut self, comm: &C) -> IoResult<()>
    where
        C: Communicator + ?Sized,
    {
        if self.state == SessionState::Closed {
            return Err(IoError::SessionClosed { operation: "abort" });
        }
        self.piece = None;
        self.state = SessionState::Closed;
        comm.all_ok(false);
        tracing::warn!("rank {} aborted export {}", comm.rank(), self.base);
        Ok(())
    }

    fn finish_collective<C>(&self, local: IoResult<()>, comm: &C) -> IoResult<()>
    where
        C: Communicator + ?Sized,
    {
        let pieces_ok = comm.all_ok(local.is_ok());
        local?;
        if !pieces_ok {
            tracing::warn!(
                "rank {}: another process failed, manifest {} not written",
                self.rank,
                self.base
            );
            return Err(IoError::PeerFailed);
        }

        let manifest = if comm.is_coordinator() {
            self.write_manifest()
        } else {
            Ok(())
        };
        let manifest_ok = comm.all_ok(manifest.is_ok());
        manifest?;
        if !manifest_ok {
            return Err(IoError::PeerFailed);
        }
        Ok(())
    }

    fn write_manifest(&self) -> IoResult<()> {
        let writer = ManifestWriter::new(
            &self.base,
            self.size,
            self.config.encoding,
            self.config.precision,
            &self.schema,
        );
        writer.write()?;
        if self.config.write_visit {
            writer.write_visit()?;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.piece = None;
        self.piece_path = None;
        self.schema.clear();
        self.state = SessionState::Uninitialized;
    }
}
