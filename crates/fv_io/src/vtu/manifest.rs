// crates/fv_io/src/vtu/manifest.rs

//! 并行清单写出
//!
//! 仅由协调进程调用。清单声明所有分片共享的字段模式，并按进程编号升序
//! 列出每个分片的相对文件名。各进程字段集合一致是调用方的约定，这里不做跨进程校验；
//! 分片文件是否存在也不检查。

use super::{escape_attribute, manifest_path, piece_source, visit_path};
use crate::config::{Encoding, Precision};
use crate::error::{IoError, IoResult};
use crate::field::{Association, FieldInfo, NumberType};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 并行清单写出器
#[derive(Debug, Clone)]
pub struct ManifestWriter<'a> {
    base: &'a str,
    n_pieces: usize,
    encoding: Encoding,
    precision: Precision,
    schema: &'a [FieldInfo],
}

impl<'a> ManifestWriter<'a> {
    /// 创建写出器
    pub fn new(
        base: &'a str,
        n_pieces: usize,
        encoding: Encoding,
        precision: Precision,
        schema: &'a [FieldInfo],
    ) -> Self {
        Self {
            base,
            n_pieces,
            encoding,
            precision,
            schema,
        }
    }

    /// 写出 `<base>.pvtu`，返回其路径
    pub fn write(&self) -> IoResult<PathBuf> {
        let path = manifest_path(self.base);
        let sources = self.sources()?;
        write_file(&path, |w| self.write_to(w, &sources))?;
        tracing::info!(
            "wrote manifest {} ({} pieces, {} fields)",
            path.display(),
            self.n_pieces,
            self.schema.len()
        );
        Ok(path)
    }

    /// 写出 VisIt `<base>.visit` 索引，返回其路径
    pub fn write_visit(&self) -> IoResult<PathBuf> {
        let path = visit_path(self.base);
        let sources = self.sources()?;
        write_file(&path, |w| {
            writeln!(w, "!NBLOCKS {}", self.n_pieces)?;
            for source in &sources {
                writeln!(w, "{source}")?;
            }
            Ok(())
        })?;
        tracing::debug!("wrote visit index {}", path.display());
        Ok(path)
    }

    /// 按编号升序的分片相对文件名
    pub fn sources(&self) -> IoResult<Vec<String>> {
        (0..self.n_pieces)
            .map(|rank| piece_source(self.base, rank))
            .collect()
    }

    /// 在任意输出上写出清单内容
    pub fn write_to<W: Write>(&self, w: &mut W, sources: &[String]) -> std::io::Result<()> {
        let format = self.encoding.vtk_format();

        writeln!(w, r#"<?xml version="1.0"?>"#)?;
        writeln!(
            w,
            r#"<VTKFile type="PUnstructuredGrid" version="0.1" byte_order="LittleEndian" header_type="UInt32">"#
        )?;
        writeln!(w, r#"  <PUnstructuredGrid GhostLevel="0">"#)?;

        writeln!(w, "    <PPoints>")?;
        writeln!(
            w,
            r#"      <PDataArray type="{}" Name="Position" NumberOfComponents="3" format="{}"/>"#,
            self.precision.vtk_type(),
            format
        )?;
        writeln!(w, "    </PPoints>")?;

        for association in [Association::Point, Association::Cell] {
            let fields: Vec<&FieldInfo> = self
                .schema
                .iter()
                .filter(|f| f.association == association)
                .collect();
            if fields.is_empty() {
                continue;
            }
            writeln!(w, "    <P{}>", association.section_tag())?;
            for field in fields {
                let vtk_type = match field.kind.number {
                    NumberType::Int32 => "Int32",
                    NumberType::Float => self.precision.vtk_type(),
                };
                write!(
                    w,
                    r#"      <PDataArray type="{}" Name="{}""#,
                    vtk_type, field.name
                )?;
                if field.kind.components > 1 {
                    write!(w, r#" NumberOfComponents="{}""#, field.kind.components)?;
                }
                writeln!(w, r#" format="{}"/>"#, format)?;
            }
            writeln!(w, "    </P{}>", association.section_tag())?;
        }

        for source in sources {
            writeln!(w, r#"    <Piece Source="{}"/>"#, escape_attribute(source))?;
        }

        writeln!(w, "  </PUnstructuredGrid>")?;
        writeln!(w, "</VTKFile>")?;
        Ok(())
    }
}

fn write_file<F>(path: &Path, body: F) -> IoResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let file = File::create(path).map_err(|e| IoError::file_system(path, e))?;
    let mut w = BufWriter::new(file);
    body(&mut w)
        .and_then(|()| w.flush())
        .map_err(|e| IoError::file_system(path, e))
}
