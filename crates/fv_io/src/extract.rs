// crates/fv_io/src/extract.rs

//! 几何提取
//!
//! 为每个本地单元计算输出空间中的角点坐标和 VTK 连接关系。
//!
//! # 点的编号
//!
//! 每个单元独立输出 `CORNERS` 个点（相邻单元不共享点），单元 k 的第 c 个
//! z-order 角点编号为 `k * CORNERS + c`。连接关系按
//! [`Dimension::VTK_NODE_ORDER`] 重排，使 VTK 看到逆时针环绕的节点顺序。

use fv_forest::ForestView;
use fv_foundation::{Dimension, FvError, FvResult};
use fv_geo::GeometryTransform;
use glam::DVec3;

/// 一个分片的几何数据
#[derive(Debug, Clone, PartialEq)]
pub struct PieceGeometry {
    /// 输出空间中的点坐标
    pub points: Vec<DVec3>,
    /// 每个单元的点编号（VTK 节点顺序）
    pub connectivity: Vec<i32>,
    /// 每个单元的角点数
    pub corners: usize,
    /// VTK 单元类型代码
    pub cell_type: u8,
}

impl PieceGeometry {
    /// 点数
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// 单元数
    pub fn n_cells(&self) -> usize {
        self.connectivity.len() / self.corners.max(1)
    }

    /// 每个单元在连接数组中的结束位置
    pub fn offsets(&self) -> impl Iterator<Item = i32> + '_ {
        let corners = self.corners as i32;
        (1..=self.n_cells() as i32).map(move |k| k * corners)
    }
}

/// 提取本地分区的几何
///
/// `transform` 为 `None` 时输出原生坐标（树角点的多线性插值）。
/// `scale < 1` 时每个单元在参考空间内绕中心收缩。
///
/// # Errors
///
/// 单元所属树不在连接关系中、层级超出范围，或点数超出 Int32 范围时返回错误。
pub fn extract_geometry<F>(
    forest: &F,
    transform: Option<&dyn GeometryTransform>,
    scale: f64,
) -> FvResult<PieceGeometry>
where
    F: ForestView + ?Sized,
{
    let corners = <F::Dim as Dimension>::CORNERS;
    let quadrants = forest.local_quadrants();
    let n_points = quadrants.len() * corners;
    if i32::try_from(n_points).is_err() {
        return Err(FvError::invalid_input(format!(
            "{n_points} 个点超出 Int32 范围"
        )));
    }

    let conn = forest.connectivity();
    let root = <F::Dim as Dimension>::ROOT_LEN as f64;
    let shrink = scale < 1.0;

    let mut points = Vec::with_capacity(n_points);
    let mut connectivity = Vec::with_capacity(n_points);

    for (k, q) in quadrants.iter().enumerate() {
        if q.level > <F::Dim as Dimension>::QMAX_LEVEL {
            return Err(FvError::invalid_input(format!(
                "单元 {k} 层级 {} 超过最大层级 {}",
                q.level,
                <F::Dim as Dimension>::QMAX_LEVEL
            )));
        }
        let center = q.center_reference::<F::Dim>();
        for c in 0..corners {
            let icorner = q.corner_coords::<F::Dim>(c);
            let mut reference = [0.0; 3];
            for axis in 0..<F::Dim as Dimension>::DIM {
                let eta = icorner[axis] as f64 / root;
                reference[axis] = if shrink {
                    center[axis] + scale * (eta - center[axis])
                } else {
                    eta
                };
            }
            let native = conn.interpolate(q.tree, reference).ok_or_else(|| {
                FvError::invalid_input(format!("单元 {k} 所属树 {} 不存在", q.tree))
            })?;
            let xyz = DVec3::from_array(native);
            points.push(match transform {
                Some(t) => t.map(q.tree, xyz),
                None => xyz,
            });
        }

        let base = (k * corners) as i32;
        connectivity.extend(
            <F::Dim as Dimension>::VTK_NODE_ORDER
                .iter()
                .map(|&c| base + c as i32),
        );
    }

    Ok(PieceGeometry {
        points,
        connectivity,
        corners,
        cell_type: <F::Dim as Dimension>::VTK_CELL_TYPE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fv_forest::{Connectivity, LocalForest, Quadrant, TreeId};
    use fv_foundation::{D2, D3};
    use fv_geo::{fn_transform, AffineTransform, Identity};

    #[test]
    fn test_counts_and_relabeling_2d() {
        let forest = LocalForest::uniform(Connectivity::<D2>::unit(), 1, 0, 1).unwrap();
        let geom = extract_geometry(&forest, None, 1.0).unwrap();
        assert_eq!(geom.n_cells(), 4);
        assert_eq!(geom.n_points(), 16);
        assert_eq!(geom.cell_type, 9);
        assert_eq!(&geom.connectivity[..4], &[0, 1, 3, 2]);
        assert_eq!(&geom.connectivity[4..8], &[4, 5, 7, 6]);
        assert_eq!(geom.offsets().collect::<Vec<_>>(), vec![4, 8, 12, 16]);
    }

    #[test]
    fn test_quad_nodes_are_counter_clockwise() {
        let forest = LocalForest::uniform(Connectivity::<D2>::unit(), 0, 0, 1).unwrap();
        let geom = extract_geometry(&forest, None, 1.0).unwrap();
        let ring: Vec<DVec3> = geom
            .connectivity
            .iter()
            .map(|&i| geom.points[i as usize])
            .collect();
        assert_eq!(
            ring,
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_hexahedron_3d() {
        let forest = LocalForest::uniform(Connectivity::<D3>::brick([2, 1, 1]), 0, 0, 1).unwrap();
        let geom = extract_geometry(&forest, None, 1.0).unwrap();
        assert_eq!(geom.n_cells(), 2);
        assert_eq!(geom.n_points(), 16);
        assert_eq!(geom.cell_type, 12);
        assert_eq!(&geom.connectivity[8..], &[8, 9, 11, 10, 12, 13, 15, 14]);
        // 第二棵树平移一个单位
        assert_eq!(geom.points[8], DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(geom.points[15], DVec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn test_identity_invariance() {
        let forest = LocalForest::uniform(Connectivity::<D2>::brick([3, 2, 1]), 2, 0, 1).unwrap();
        let native = extract_geometry(&forest, None, 1.0).unwrap();
        let identity = extract_geometry(&forest, Some(&Identity), 1.0).unwrap();
        assert_eq!(native, identity);

        let conn = Connectivity::<D2>::brick([3, 2, 1]);
        for (k, q) in forest.local_quadrants().iter().enumerate() {
            let c = q.corner_coords::<D2>(3);
            let reference = [
                c[0] as f64 / D2::ROOT_LEN as f64,
                c[1] as f64 / D2::ROOT_LEN as f64,
                0.0,
            ];
            let expected = conn.interpolate(q.tree, reference).unwrap();
            assert_eq!(native.points[k * 4 + 3].to_array(), expected);
        }
    }

    #[test]
    fn test_transform_called_per_corner() {
        use std::cell::Cell;
        let calls = Cell::new(0usize);
        let counting = fn_transform(|_tree: TreeId, xyz: DVec3| {
            calls.set(calls.get() + 1);
            xyz
        });
        let forest = LocalForest::uniform(Connectivity::<D3>::unit(), 1, 0, 1).unwrap();
        extract_geometry(&forest, Some(&counting), 1.0).unwrap();
        assert_eq!(calls.get(), 8 * 8);
    }

    #[test]
    fn test_affine_transform_applied() {
        let forest = LocalForest::uniform(Connectivity::<D2>::unit(), 0, 0, 1).unwrap();
        let scale = AffineTransform::scale(DVec3::new(10.0, 2.0, 1.0));
        let geom = extract_geometry(&forest, Some(&scale), 1.0).unwrap();
        assert_eq!(geom.points[3], DVec3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn test_non_finite_passes_through() {
        let forest = LocalForest::uniform(Connectivity::<D2>::unit(), 0, 0, 1).unwrap();
        let broken = fn_transform(|_tree: TreeId, _xyz: DVec3| DVec3::splat(f64::NAN));
        let geom = extract_geometry(&forest, Some(&broken), 1.0).unwrap();
        assert!(geom.points.iter().all(|p| p.x.is_nan()));
    }

    #[test]
    fn test_scale_shrinks_about_center() {
        let forest = LocalForest::uniform(Connectivity::<D2>::unit(), 0, 0, 1).unwrap();
        let geom = extract_geometry(&forest, None, 0.5).unwrap();
        assert_eq!(geom.points[0], DVec3::new(0.25, 0.25, 0.0));
        assert_eq!(geom.points[3], DVec3::new(0.75, 0.75, 0.0));
    }

    #[test]
    fn test_empty_partition() {
        let forest = LocalForest::new(Connectivity::<D2>::unit(), Vec::new()).unwrap();
        let geom = extract_geometry(&forest, None, 1.0).unwrap();
        assert_eq!(geom.n_points(), 0);
        assert_eq!(geom.n_cells(), 0);
    }

    struct Broken(Connectivity<D2>, Vec<Quadrant>);

    impl ForestView for Broken {
        type Dim = D2;
        fn connectivity(&self) -> &Connectivity<D2> {
            &self.0
        }
        fn local_quadrants(&self) -> &[Quadrant] {
            &self.1
        }
    }

    #[test]
    fn test_unknown_tree_is_error() {
        let view = Broken(
            Connectivity::unit(),
            vec![Quadrant::new(TreeId(9), 0, [0; 3])],
        );
        assert!(extract_geometry(&view, None, 1.0).is_err());
    }

    #[test]
    fn test_level_out_of_range_is_error() {
        for level in [D2::MAX_LEVEL, 31, u8::MAX] {
            let view = Broken(
                Connectivity::unit(),
                vec![Quadrant::new(TreeId(0), level, [0; 3])],
            );
            let err = extract_geometry(&view, None, 1.0).unwrap_err();
            assert!(matches!(err, FvError::InvalidInput { .. }), "level {level}: {err}");
        }

        let deepest = Broken(
            Connectivity::unit(),
            vec![Quadrant::new(TreeId(0), D2::QMAX_LEVEL, [0; 3])],
        );
        assert_eq!(extract_geometry(&deepest, None, 1.0).unwrap().n_cells(), 1);
    }
}
