//! Minimum-cost perfect assignment (Kuhn-Munkres with potentials).
//!
//! O(n³) shortest-augmenting-path formulation. Rows and columns are
//! 1-indexed internally with slot 0 acting as the virtual source.

use ndarray::Array2;

/// Result of an assignment solve
#[derive(Debug, Clone)]
pub(crate) struct Assignment {
    /// `row_to_col[i]` is the column matched to row i
    pub row_to_col: Vec<usize>,
    pub total_cost: f64,
}

/// Solve the assignment problem for a square, finite cost matrix
pub(crate) fn solve_assignment(cost: &Array2<f64>) -> Assignment {
    let n = cost.nrows();
    debug_assert_eq!(n, cost.ncols(), "assignment needs a square cost matrix");
    if n == 0 {
        return Assignment {
            row_to_col: Vec::new(),
            total_cost: 0.0,
        };
    }

    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    // p[j]: row currently assigned to column j (0 = none)
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost[[i0 - 1, j - 1]] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // Flip the augmenting path
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0usize; n];
    for j in 1..=n {
        row_to_col[p[j] - 1] = j - 1;
    }
    let total_cost = row_to_col
        .iter()
        .enumerate()
        .map(|(i, &j)| cost[[i, j]])
        .sum();

    Assignment {
        row_to_col,
        total_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classic_instance() {
        let cost = array![
            [4.0, 1.0, 3.0],
            [2.0, 0.0, 5.0],
            [3.0, 2.0, 2.0]
        ];
        let a = solve_assignment(&cost);
        assert_eq!(a.total_cost, 5.0);
        assert_eq!(a.row_to_col, vec![1, 0, 2]);
    }

    #[test]
    fn test_matches_brute_force() {
        let cost = array![
            [7.0, 5.5, 9.0, 2.0],
            [1.5, 8.0, 4.0, 6.0],
            [3.0, 2.5, 7.5, 9.5],
            [6.0, 4.5, 1.0, 3.5]
        ];
        let mut best = f64::INFINITY;
        let perms = permutations(4);
        for perm in &perms {
            let c: f64 = perm.iter().enumerate().map(|(i, &j)| cost[[i, j]]).sum();
            best = best.min(c);
        }
        let a = solve_assignment(&cost);
        assert!((a.total_cost - best).abs() < 1e-12);

        let mut seen = a.row_to_col.clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty() {
        let a = solve_assignment(&Array2::zeros((0, 0)));
        assert_eq!(a.total_cost, 0.0);
        assert!(a.row_to_col.is_empty());
    }

    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![Vec::new()];
        }
        let mut out = Vec::new();
        for perm in permutations(n - 1) {
            for pos in 0..=perm.len() {
                let mut p = perm.clone();
                p.insert(pos, n - 1);
                out.push(p);
            }
        }
        out
    }
}
