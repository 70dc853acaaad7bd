// crates/fv_io/src/vtu/piece.rs

//! 分片写出器
//!
//! 一次写出一个进程的 `.vtu` 文件，顺序固定：
//!
//! 1. XML 头和 `<Piece>`，声明点数和单元数
//! 2. `<Points>` 与 `<Cells>`
//! 3. 零个或多个数据字段，按调用顺序追加
//! 4. 结束标签
//!
//! 点字段写在 `<PointData>`，单元字段写在 `<CellData>`。数据段在第一个字段到来时打开，
//! 在另一类字段到来或收尾时关闭；VTK 每个分片只读取一个同名数据段，
//! 因此已关闭的数据段不能重新打开。
//!
//! 字段先整体校验再写出，校验失败时文件内容保持不变。

use super::encoder::write_data_array;
use crate::config::{Encoding, ExportConfig, Precision};
use crate::error::{IoError, IoResult};
use crate::extract::PieceGeometry;
use crate::field::{Association, FieldData, FieldDescriptor};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 类型擦除后的分片输出
pub type PieceSink = Box<dyn Write + Send>;

/// 分片写出器
pub struct PieceWriter<W: Write = BufWriter<File>> {
    /// 目标路径（用于错误信息）
    path: PathBuf,
    out: W,
    encoding: Encoding,
    precision: Precision,
    n_points: usize,
    n_cells: usize,
    open_section: Option<Association>,
    closed_sections: Vec<Association>,
}

impl PieceWriter<BufWriter<File>> {
    /// 创建（或截断）分片文件，写出头部和几何
    pub fn create(
        path: impl AsRef<Path>,
        config: &ExportConfig,
        geometry: &PieceGeometry,
    ) -> IoResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| IoError::file_system(path, e))?;
        tracing::debug!("opened piece {}", path.display());
        Self::from_writer(BufWriter::new(file), path, config, geometry)
    }
}

impl<W: Write> fmt::Debug for PieceWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PieceWriter")
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .field("precision", &self.precision)
            .field("n_points", &self.n_points)
            .field("n_cells", &self.n_cells)
            .field("open_section", &self.open_section)
            .finish_non_exhaustive()
    }
}

impl<W: Write + Send + 'static> PieceWriter<W> {
    /// 擦除输出类型，已写出的内容和数据段状态保持不变
    pub fn into_sink(self) -> PieceWriter<PieceSink> {
        PieceWriter {
            path: self.path,
            out: Box::new(self.out),
            encoding: self.encoding,
            precision: self.precision,
            n_points: self.n_points,
            n_cells: self.n_cells,
            open_section: self.open_section,
            closed_sections: self.closed_sections,
        }
    }
}

impl<W: Write> PieceWriter<W> {
    /// 在任意输出上写出头部和几何
    pub fn from_writer(
        out: W,
        path: impl Into<PathBuf>,
        config: &ExportConfig,
        geometry: &PieceGeometry,
    ) -> IoResult<Self> {
        let mut writer = Self {
            path: path.into(),
            out,
            encoding: config.encoding,
            precision: config.precision,
            n_points: geometry.n_points(),
            n_cells: geometry.n_cells(),
            open_section: None,
            closed_sections: Vec::new(),
        };
        if i32::try_from(writer.n_points).is_err() {
            return Err(IoError::PieceTooLarge {
                points: writer.n_points,
            });
        }
        writer.write_header(geometry)?;
        Ok(writer)
    }

    /// 分片路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 点数
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// 单元数
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 期望的字段元组数
    pub fn expected_len(&self, association: Association) -> usize {
        match association {
            Association::Point => self.n_points,
            Association::Cell => self.n_cells,
        }
    }

    /// 检查字段能否写出（不修改文件）
    pub fn check_field(&self, field: &FieldDescriptor<'_>) -> IoResult<()> {
        let expected = self.expected_len(field.association);
        if field.data.len() != expected {
            return Err(IoError::FieldLengthMismatch {
                name: field.name.to_string(),
                expected,
                actual: field.data.len(),
            });
        }
        if self.closed_sections.contains(&field.association) {
            return Err(IoError::SectionClosed {
                name: field.name.to_string(),
                association: field.association,
            });
        }
        Ok(())
    }

    /// 追加一个数据字段
    pub fn write_field(&mut self, field: &FieldDescriptor<'_>) -> IoResult<()> {
        self.check_field(field)?;
        self.io(|w| w.write_field_unchecked(field))
    }

    /// 关闭所有元素并刷新输出，返回底层输出
    pub fn finish(mut self) -> IoResult<W> {
        self.io(|w| {
            w.close_section()?;
            writeln!(w.out, "    </Piece>")?;
            writeln!(w.out, "  </UnstructuredGrid>")?;
            writeln!(w.out, "</VTKFile>")?;
            w.out.flush()
        })?;
        tracing::debug!(
            "closed piece {} ({} points, {} cells)",
            self.path.display(),
            self.n_points,
            self.n_cells
        );
        Ok(self.out)
    }

    fn io<F>(&mut self, f: F) -> IoResult<()>
    where
        F: FnOnce(&mut Self) -> std::io::Result<()>,
    {
        f(self).map_err(|e| IoError::file_system(self.path.clone(), e))
    }

    fn write_header(&mut self, geometry: &PieceGeometry) -> IoResult<()> {
        self.io(|w| {
            writeln!(w.out, r#"<?xml version="1.0"?>"#)?;
            writeln!(
                w.out,
                r#"<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian" header_type="UInt32">"#
            )?;
            writeln!(w.out, "  <UnstructuredGrid>")?;
            writeln!(
                w.out,
                r#"    <Piece NumberOfPoints="{}" NumberOfCells="{}">"#,
                w.n_points, w.n_cells
            )?;
            w.write_points(geometry)?;
            w.write_cells(geometry)
        })
    }

    fn write_points(&mut self, geometry: &PieceGeometry) -> std::io::Result<()> {
        writeln!(self.out, "      <Points>")?;
        match self.precision {
            Precision::F32 => {
                let coords: Vec<f32> = geometry
                    .points
                    .iter()
                    .flat_map(|p| p.as_vec3().to_array())
                    .collect();
                write_data_array(&mut self.out, self.encoding, "Position", 3, 3, &coords)?;
            }
            Precision::F64 => {
                let coords: Vec<f64> = geometry.points.iter().flat_map(|p| p.to_array()).collect();
                write_data_array(&mut self.out, self.encoding, "Position", 3, 3, &coords)?;
            }
        }
        writeln!(self.out, "      </Points>")
    }

    fn write_cells(&mut self, geometry: &PieceGeometry) -> std::io::Result<()> {
        let corners = geometry.corners.max(1);
        writeln!(self.out, "      <Cells>")?;
        write_data_array(
            &mut self.out,
            self.encoding,
            "connectivity",
            1,
            corners,
            &geometry.connectivity,
        )?;
        let offsets: Vec<i32> = geometry.offsets().collect();
        write_data_array(&mut self.out, self.encoding, "offsets", 1, 8, &offsets)?;
        let types = vec![geometry.cell_type; geometry.n_cells()];
        write_data_array(&mut self.out, self.encoding, "types", 1, 16, &types)?;
        writeln!(self.out, "      </Cells>")
    }

    fn open_section(&mut self, association: Association) -> std::io::Result<()> {
        if self.open_section == Some(association) {
            return Ok(());
        }
        self.close_section()?;
        writeln!(self.out, "      <{}>", association.section_tag())?;
        self.open_section = Some(association);
        Ok(())
    }

    fn close_section(&mut self) -> std::io::Result<()> {
        if let Some(open) = self.open_section.take() {
            writeln!(self.out, "      </{}>", open.section_tag())?;
            self.closed_sections.push(open);
        }
        Ok(())
    }

    fn write_field_unchecked(&mut self, field: &FieldDescriptor<'_>) -> std::io::Result<()> {
        self.open_section(field.association)?;
        let (enc, name) = (self.encoding, field.name);
        match (field.data, self.precision) {
            (FieldData::ScalarF64(v), Precision::F64) => {
                write_data_array(&mut self.out, enc, name, 1, 1, v)
            }
            (FieldData::ScalarF64(v), Precision::F32) => {
                let v: Vec<f32> = v.iter().map(|&x| x as f32).collect();
                write_data_array(&mut self.out, enc, name, 1, 1, &v)
            }
            (FieldData::VectorF64(v), Precision::F64) => {
                let flat: Vec<f64> = v.iter().flatten().copied().collect();
                write_data_array(&mut self.out, enc, name, 3, 3, &flat)
            }
            (FieldData::VectorF64(v), Precision::F32) => {
                let flat: Vec<f32> = v.iter().flatten().map(|&x| x as f32).collect();
                write_data_array(&mut self.out, enc, name, 3, 3, &flat)
            }
            (FieldData::ScalarI32(v), _) => write_data_array(&mut self.out, enc, name, 1, 1, v),
            (FieldData::VectorI32(v), _) => {
                let flat: Vec<i32> = v.iter().flatten().copied().collect();
                write_data_array(&mut self.out, enc, name, 3, 3, &flat)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_geometry;
    use fv_forest::{Connectivity, LocalForest};
    use fv_foundation::D2;

    fn geometry(level: u8) -> PieceGeometry {
        let forest = LocalForest::uniform(Connectivity::<D2>::unit(), level, 0, 1).unwrap();
        extract_geometry(&forest, None, 1.0).unwrap()
    }

    fn writer(level: u8) -> PieceWriter<Vec<u8>> {
        PieceWriter::from_writer(Vec::new(), "mem.vtu", &ExportConfig::default(), &geometry(level))
            .unwrap()
    }

    #[test]
    fn test_header_counts() {
        let w = writer(1);
        let text = String::from_utf8(w.finish().unwrap()).unwrap();
        assert!(text.contains(r#"<Piece NumberOfPoints="16" NumberOfCells="4">"#));
        assert!(text.contains(r#"<DataArray type="Float32" Name="Position" NumberOfComponents="3""#));
        assert!(text.contains(r#"Name="connectivity""#));
        assert!(text.contains(" 0 1 3 2\n"));
        assert!(text.contains(r#"byte_order="LittleEndian" header_type="UInt32""#));
        assert!(text.trim_end().ends_with("</VTKFile>"));
        assert!(!text.contains("CellData"));
    }

    #[test]
    fn test_sections_open_lazily() {
        let mut w = writer(1);
        let cell = [1.0; 4];
        let point = [2.0; 16];
        w.write_field(&FieldDescriptor::cell_scalar("a", &cell)).unwrap();
        w.write_field(&FieldDescriptor::cell_scalar("b", &cell)).unwrap();
        w.write_field(&FieldDescriptor::point_scalar("c", &point)).unwrap();
        let text = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(text.matches("<CellData>").count(), 1);
        assert_eq!(text.matches("</CellData>").count(), 1);
        assert_eq!(text.matches("<PointData>").count(), 1);
        assert!(text.find("</CellData>").unwrap() < text.find("<PointData>").unwrap());
    }

    #[test]
    fn test_closed_section_rejected_without_writing() {
        let mut w = writer(0);
        let cell = [1.0];
        let point = [0.5; 4];
        w.write_field(&FieldDescriptor::cell_scalar("a", &cell)).unwrap();
        w.write_field(&FieldDescriptor::point_scalar("p", &point)).unwrap();
        let before = w.out.len();
        let err = w
            .write_field(&FieldDescriptor::cell_scalar("b", &cell))
            .unwrap_err();
        assert!(matches!(err, IoError::SectionClosed { .. }));
        assert_eq!(w.out.len(), before);
    }

    #[test]
    fn test_length_mismatch_rejected_without_writing() {
        let mut w = writer(1);
        let before = w.out.len();
        let short = [0.0; 3];
        let err = w
            .write_field(&FieldDescriptor::cell_scalar("h", &short))
            .unwrap_err();
        assert!(matches!(
            err,
            IoError::FieldLengthMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
        assert_eq!(w.out.len(), before);
    }

    #[test]
    fn test_vector_and_precision() {
        let config = ExportConfig {
            precision: Precision::F64,
            ..Default::default()
        };
        let mut w = PieceWriter::from_writer(Vec::new(), "mem.vtu", &config, &geometry(0)).unwrap();
        let v = [[1.0, 2.0, 3.0]];
        w.write_field(&FieldDescriptor::cell_vector("v", &v)).unwrap();
        let text = String::from_utf8(w.finish().unwrap()).unwrap();
        assert!(text.contains(r#"<DataArray type="Float64" Name="v" NumberOfComponents="3""#));
        assert!(text.contains(" 1e0 2e0 3e0\n"));
    }
}
