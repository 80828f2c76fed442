//! Cost matrices and linear assignment for detection-to-face matching.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tracker::rect::Rect;

/// Cost of the dummy cells that square up a rectangular problem.
const PADDING_COST: f64 = 1e6;

/// Linear assignment solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentSolver {
    /// Kuhn-Munkres. Among equal-cost optima it keeps the zeros starred
    /// first in row-major order, so ties go to the earliest detection and
    /// the lowest face id.
    #[default]
    Hungarian,
    /// Jonker-Volgenant shortest augmenting path (`lapjv`).
    JonkerVolgenant,
}

impl AssignmentSolver {
    /// Assign each row of `cost_matrix` to at most one column.
    ///
    /// Returns one entry per row: the assigned column, or `None` when the
    /// row was left over (more rows than columns).
    pub fn solve(self, cost_matrix: &Array2<f64>) -> Vec<Option<usize>> {
        let (num_rows, num_cols) = cost_matrix.dim();
        if num_rows == 0 || num_cols == 0 {
            return vec![None; num_rows];
        }

        let padded = pad_square(cost_matrix);
        let row_to_col = match self {
            AssignmentSolver::Hungarian => hungarian(&padded),
            AssignmentSolver::JonkerVolgenant => match lapjv::lapjv(&padded) {
                Ok((row_to_col, _)) => row_to_col.into_iter().map(Some).collect(),
                Err(err) => {
                    warn!(error = ?err, "lapjv failed, falling back to Hungarian solver");
                    hungarian(&padded)
                }
            },
        };

        row_to_col
            .into_iter()
            .take(num_rows)
            .map(|col| col.filter(|&col| col < num_cols))
            .collect()
    }
}

/// Centroid distance between every detection (rows) and face box (columns).
pub fn centroid_distance(det_boxes: &[Rect], face_boxes: &[Rect]) -> Array2<f64> {
    let mut dists = Array2::zeros((det_boxes.len(), face_boxes.len()));
    for (i, d) in det_boxes.iter().enumerate() {
        for (j, f) in face_boxes.iter().enumerate() {
            dists[[i, j]] = d.centroid_distance(f);
        }
    }
    dists
}

/// Square the matrix with `PADDING_COST` cells. Non-finite costs are
/// replaced by the padding cost so the solvers always terminate.
fn pad_square(cost_matrix: &Array2<f64>) -> Array2<f64> {
    let (num_rows, num_cols) = cost_matrix.dim();
    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), PADDING_COST);

    for i in 0..num_rows {
        for j in 0..num_cols {
            let cost = cost_matrix[[i, j]];
            padded[[i, j]] = if cost.is_finite() { cost } else { PADDING_COST };
        }
    }
    padded
}

/// Kuhn-Munkres on a square matrix of finite costs.
/// Returns the column starred in each row.
fn hungarian(cost_matrix: &Array2<f64>) -> Vec<Option<usize>> {
    let n = cost_matrix.nrows();
    let mut c = cost_matrix.clone();

    // Row reduction: every row gets at least one zero.
    for i in 0..n {
        let min = c.row(i).fold(f64::INFINITY, |acc, &v| acc.min(v));
        c.row_mut(i).mapv_inplace(|v| v - min);
    }

    let mut star_in_row: Vec<Option<usize>> = vec![None; n];
    let mut star_in_col: Vec<Option<usize>> = vec![None; n];
    let mut prime_in_row: Vec<Option<usize>> = vec![None; n];
    let mut row_covered = vec![false; n];
    let mut col_covered = vec![false; n];

    // Star the first independent zeros, row-major.
    for i in 0..n {
        for j in 0..n {
            if c[[i, j]] == 0.0 && star_in_row[i].is_none() && star_in_col[j].is_none() {
                star_in_row[i] = Some(j);
                star_in_col[j] = Some(i);
            }
        }
    }

    loop {
        // Cover every column holding a starred zero.
        for (j, covered) in col_covered.iter_mut().enumerate() {
            *covered = star_in_col[j].is_some();
        }
        if col_covered.iter().filter(|&&covered| covered).count() == n {
            break;
        }

        // Prime uncovered zeros until one has no star in its row.
        let (mut path_row, mut path_col) = loop {
            match find_uncovered_zero(&c, &row_covered, &col_covered) {
                Some((i, j)) => {
                    prime_in_row[i] = Some(j);
                    match star_in_row[i] {
                        Some(star_col) => {
                            row_covered[i] = true;
                            col_covered[star_col] = false;
                        }
                        None => break (i, j),
                    }
                }
                None => adjust_uncovered(&mut c, &row_covered, &col_covered),
            }
        };

        // Alternate primes and stars from the last prime, then flip them.
        let mut path = vec![(path_row, path_col)];
        while let Some(star_row) = star_in_col[path_col] {
            // A row with a star is only covered after one of its zeros was primed.
            let Some(prime_col) = prime_in_row[star_row] else {
                break;
            };
            path.push((star_row, path_col));
            path_row = star_row;
            path_col = prime_col;
            path.push((path_row, path_col));
        }
        for &(i, j) in path.iter().skip(1).step_by(2) {
            star_in_row[i] = None;
            star_in_col[j] = None;
        }
        for &(i, j) in path.iter().step_by(2) {
            star_in_row[i] = Some(j);
            star_in_col[j] = Some(i);
        }

        prime_in_row.fill(None);
        row_covered.fill(false);
        col_covered.fill(false);
    }

    star_in_row
}

fn find_uncovered_zero(
    c: &Array2<f64>,
    row_covered: &[bool],
    col_covered: &[bool],
) -> Option<(usize, usize)> {
    let n = c.nrows();
    (0..n)
        .filter(|&i| !row_covered[i])
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .find(|&(i, j)| !col_covered[j] && c[[i, j]] == 0.0)
}

/// Subtract the smallest uncovered value from uncovered columns and add it
/// to covered rows.
fn adjust_uncovered(c: &mut Array2<f64>, row_covered: &[bool], col_covered: &[bool]) {
    let n = c.nrows();
    let mut min = f64::INFINITY;
    for i in (0..n).filter(|&i| !row_covered[i]) {
        for j in (0..n).filter(|&j| !col_covered[j]) {
            min = min.min(c[[i, j]]);
        }
    }

    for i in 0..n {
        for j in 0..n {
            if row_covered[i] {
                c[[i, j]] += min;
            }
            if !col_covered[j] {
                c[[i, j]] -= min;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn total(cost: &Array2<f64>, assignment: &[Option<usize>]) -> f64 {
        assignment
            .iter()
            .enumerate()
            .filter_map(|(i, col)| col.map(|j| cost[[i, j]]))
            .sum()
    }

    #[test]
    fn test_hungarian_swapped_2x2() {
        let cost = array![[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(
            AssignmentSolver::Hungarian.solve(&cost),
            vec![Some(1), Some(0)]
        );
    }

    #[test]
    fn test_hungarian_needs_augmenting_path() {
        let cost = array![[4.0, 1.0, 3.0], [2.0, 0.0, 5.0], [3.0, 2.0, 2.0]];
        let assignment = AssignmentSolver::Hungarian.solve(&cost);
        assert_eq!(assignment, vec![Some(1), Some(0), Some(2)]);
        assert_eq!(total(&cost, &assignment), 5.0);
    }

    #[test]
    fn test_ties_resolve_row_major() {
        let cost = Array2::zeros((3, 3));
        assert_eq!(
            AssignmentSolver::Hungarian.solve(&cost),
            vec![Some(0), Some(1), Some(2)]
        );

        let cost = array![[5.0, 5.0], [5.0, 5.0]];
        assert_eq!(
            AssignmentSolver::Hungarian.solve(&cost),
            vec![Some(0), Some(1)]
        );
    }

    #[test]
    fn test_more_rows_than_columns() {
        let cost = array![[5.0, 9.0], [4.0, 6.0], [3.0, 1.0]];
        let assignment = AssignmentSolver::Hungarian.solve(&cost);

        assert_eq!(assignment.len(), 3);
        assert_eq!(assignment.iter().filter(|a| a.is_none()).count(), 1);
        assert_eq!(assignment, vec![None, Some(0), Some(1)]);
    }

    #[test]
    fn test_more_columns_than_rows() {
        let cost = array![[7.0, 2.0, 9.0]];
        assert_eq!(AssignmentSolver::Hungarian.solve(&cost), vec![Some(1)]);
    }

    #[test]
    fn test_empty_inputs() {
        let no_faces = Array2::<f64>::zeros((2, 0));
        assert_eq!(AssignmentSolver::Hungarian.solve(&no_faces), vec![None, None]);
        let no_detections = Array2::<f64>::zeros((0, 3));
        assert!(AssignmentSolver::Hungarian.solve(&no_detections).is_empty());
    }

    #[test]
    fn test_non_finite_costs_do_not_hang() {
        let cost = array![[f64::NAN, 1.0], [2.0, f64::INFINITY]];
        assert_eq!(
            AssignmentSolver::Hungarian.solve(&cost),
            vec![Some(1), Some(0)]
        );
    }

    #[test]
    fn test_solvers_agree_on_total_cost() {
        let cost = array![
            [12.0, 40.0, 7.5, 90.0],
            [3.0, 18.0, 64.0, 21.0],
            [55.0, 2.5, 33.0, 14.0],
            [9.0, 27.0, 11.0, 6.0],
        ];
        let hungarian = AssignmentSolver::Hungarian.solve(&cost);
        let jv = AssignmentSolver::JonkerVolgenant.solve(&cost);

        assert!((total(&cost, &hungarian) - total(&cost, &jv)).abs() < 1e-9);
        assert_eq!(total(&cost, &hungarian), 19.0);
    }

    #[test]
    fn test_deterministic() {
        let dets = [
            Rect::new(0.0, 0.0, 20.0, 20.0),
            Rect::new(100.0, 0.0, 20.0, 20.0),
            Rect::new(50.0, 0.0, 20.0, 20.0),
        ];
        let faces = [Rect::new(52.0, 0.0, 20.0, 20.0), Rect::new(2.0, 0.0, 20.0, 20.0)];
        let cost = centroid_distance(&dets, &faces);

        let first = AssignmentSolver::Hungarian.solve(&cost);
        for _ in 0..10 {
            assert_eq!(AssignmentSolver::Hungarian.solve(&cost), first);
        }
        assert_eq!(first, vec![Some(1), None, Some(0)]);
    }
}
