// crates/fv_forest/src/connectivity.rs

//! 树连接关系
//!
//! 记录每棵树的角点在物理（顶点）空间中的位置。单元角点的原生坐标
//! 由所属树角点的多线性插值得到。树间的面/边邻接关系与导出无关，不在此存储。

use crate::quadrant::TreeId;
use fv_foundation::{Dimension, FvError, FvResult};
use std::marker::PhantomData;

/// 树连接关系
#[derive(Debug, Clone)]
pub struct Connectivity<D: Dimension> {
    /// 顶点坐标表
    vertices: Vec<[f64; 3]>,
    /// 每棵树 `D::CORNERS` 个顶点下标（z-order）
    tree_to_vertex: Vec<usize>,
    _dim: PhantomData<D>,
}

impl<D: Dimension> Connectivity<D> {
    /// 由顶点表和树-顶点表创建
    ///
    /// # Errors
    ///
    /// 树-顶点表长度不是角点数的整数倍，或顶点下标越界时返回错误。
    pub fn new(vertices: Vec<[f64; 3]>, tree_to_vertex: Vec<usize>) -> FvResult<Self> {
        if tree_to_vertex.len() % D::CORNERS != 0 {
            return Err(FvError::invalid_input(format!(
                "树-顶点表长度 {} 不是 {} 的整数倍",
                tree_to_vertex.len(),
                D::CORNERS
            )));
        }
        if let Some(&bad) = tree_to_vertex.iter().find(|&&v| v >= vertices.len()) {
            return Err(FvError::invalid_input(format!(
                "顶点下标 {bad} 超出范围 0..{}",
                vertices.len()
            )));
        }
        Ok(Self {
            vertices,
            tree_to_vertex,
            _dim: PhantomData,
        })
    }

    /// 单位正方形/立方体，一棵树
    pub fn unit() -> Self {
        Self::brick([1, 1, 1])
    }

    /// 规则排列的树阵列，每棵树占据一个单位格
    ///
    /// `dims` 为 x/y/z 方向的树数量，2D 时忽略 z 分量。任一分量为 0 时按 1 处理。
    pub fn brick(dims: [usize; 3]) -> Self {
        let nx = dims[0].max(1);
        let ny = dims[1].max(1);
        let nz = if D::DIM == 3 { dims[2].max(1) } else { 1 };

        let vx = nx + 1;
        let vy = ny + 1;
        let vz = if D::DIM == 3 { nz + 1 } else { 1 };

        let mut vertices = Vec::with_capacity(vx * vy * vz);
        for k in 0..vz {
            for j in 0..vy {
                for i in 0..vx {
                    vertices.push([i as f64, j as f64, k as f64]);
                }
            }
        }

        let mut tree_to_vertex = Vec::with_capacity(nx * ny * nz * D::CORNERS);
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    for c in 0..D::CORNERS {
                        let ci = i + (c & 1);
                        let cj = j + ((c >> 1) & 1);
                        let ck = k + ((c >> 2) & 1);
                        tree_to_vertex.push(ci + vx * (cj + vy * ck));
                    }
                }
            }
        }

        Self {
            vertices,
            tree_to_vertex,
            _dim: PhantomData,
        }
    }

    /// 树数量
    pub fn num_trees(&self) -> usize {
        self.tree_to_vertex.len() / D::CORNERS
    }

    /// 顶点数量
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// 树的角点坐标（z-order），树编号越界时返回 `None`
    pub fn tree_corners(&self, tree: TreeId) -> Option<impl Iterator<Item = [f64; 3]> + '_> {
        let start = tree.index().checked_mul(D::CORNERS)?;
        let indices = self.tree_to_vertex.get(start..start + D::CORNERS)?;
        Some(indices.iter().map(move |&v| self.vertices[v]))
    }

    /// 参考坐标 `[0, 1]^DIM` 到顶点空间的多线性插值
    ///
    /// 树编号越界时返回 `None`。
    pub fn interpolate(&self, tree: TreeId, reference: [f64; 3]) -> Option<[f64; 3]> {
        let mut xyz = [0.0; 3];
        for (c, vertex) in self.tree_corners(tree)?.enumerate() {
            let mut weight = 1.0;
            for axis in 0..D::DIM {
                let eta = reference[axis];
                weight *= if c & (1 << axis) != 0 { eta } else { 1.0 - eta };
            }
            for axis in 0..3 {
                xyz[axis] += weight * vertex[axis];
            }
        }
        Some(xyz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fv_foundation::{D2, D3};

    #[test]
    fn test_unit_square() {
        let conn = Connectivity::<D2>::unit();
        assert_eq!(conn.num_trees(), 1);
        assert_eq!(conn.num_vertices(), 4);
        let corners: Vec<_> = conn.tree_corners(TreeId(0)).unwrap().collect();
        assert_eq!(corners[3], [1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_brick_3d() {
        let conn = Connectivity::<D3>::brick([2, 1, 3]);
        assert_eq!(conn.num_trees(), 6);
        assert_eq!(conn.num_vertices(), 3 * 2 * 4);
        // 最后一棵树 (1, 0, 2) 的最高角点
        let corners: Vec<_> = conn.tree_corners(TreeId(5)).unwrap().collect();
        assert_eq!(corners[7], [2.0, 1.0, 3.0]);
        assert_eq!(corners[0], [1.0, 0.0, 2.0]);
    }

    #[test]
    fn test_interpolate_bilinear() {
        let conn = Connectivity::<D2>::new(
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [2.0, 4.0, 1.0]],
            vec![0, 1, 2, 3],
        )
        .unwrap();
        let p = conn.interpolate(TreeId(0), [0.5, 0.5, 0.0]).unwrap();
        assert!((p[0] - 1.0).abs() < 1e-12);
        assert!((p[1] - 2.0).abs() < 1e-12);
        assert!((p[2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_tree() {
        let conn = Connectivity::<D2>::unit();
        assert!(conn.interpolate(TreeId(1), [0.0; 3]).is_none());
    }

    #[test]
    fn test_invalid_tables() {
        assert!(Connectivity::<D2>::new(vec![[0.0; 3]; 4], vec![0, 1, 2]).is_err());
        assert!(Connectivity::<D2>::new(vec![[0.0; 3]; 3], vec![0, 1, 2, 3]).is_err());
    }
}
