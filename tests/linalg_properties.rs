use neurogen::math::{Matrix, NdArray};
use proptest::prelude::*;

prop_compose! {
    fn arb_matrix(max_dim: usize)(
        rows in 1..max_dim,
        cols in 1..max_dim,
    )(
        data in prop::collection::vec(-10.0f64..10.0, rows * cols),
        rows in Just(rows),
        cols in Just(cols),
    ) -> Matrix {
        Matrix::from_vec(data, rows, cols).unwrap()
    }
}

prop_compose! {
    fn arb_matmul_pair(max_dim: usize)(
        m in 1..max_dim,
        n in 1..max_dim,
        p in 1..max_dim,
    )(
        a in prop::collection::vec(-10.0f64..10.0, m * n),
        b in prop::collection::vec(-10.0f64..10.0, n * p),
        m in Just(m),
        n in Just(n),
        p in Just(p),
    ) -> (Matrix, Matrix) {
        (
            Matrix::from_vec(a, m, n).unwrap(),
            Matrix::from_vec(b, n, p).unwrap(),
        )
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_strassen_matches_naive((a, b) in arb_matmul_pair(9)) {
        let naive = Matrix::matmul(&a, &b).unwrap();
        // Cutoff 1 forces the recursive path even for tiny operands.
        let strassen = Matrix::strassen_mul_with_cutoff(&a, &b, 1).unwrap();

        prop_assert_eq!(naive.rows(), strassen.rows());
        prop_assert_eq!(naive.cols(), strassen.cols());
        for (x, y) in naive.as_slice().iter().zip(strassen.as_slice()) {
            prop_assert!((x - y).abs() < 1e-9, "naive {} vs strassen {}", x, y);
        }
    }

    #[test]
    fn test_transpose_involution(a in arb_matrix(9)) {
        let back = a.transpose().transpose();
        prop_assert_eq!(a, back);
    }

    #[test]
    fn test_reshape_crop_then_restore(
        rows in 1usize..7,
        cols in 1usize..7,
        new_rows in 1usize..7,
        new_cols in 1usize..7,
    ) {
        let mut array = NdArray::zeros(&[rows, cols]);
        for i in 0..rows {
            for j in 0..cols {
                array.set(&[i as i64, j as i64], (i * cols + j + 1) as f64).unwrap();
            }
        }

        let mut reshaped = array.clone();
        reshaped.reshape(&[new_rows, new_cols]).unwrap();
        reshaped.reshape(&[rows, cols]).unwrap();

        // The region surviving both resizes is intact; everything cropped
        // on the way is zero-filled on the way back.
        for i in 0..rows {
            for j in 0..cols {
                let expected = if i < new_rows && j < new_cols {
                    (i * cols + j + 1) as f64
                } else {
                    0.0
                };
                prop_assert_eq!(reshaped.get(&[i as i64, j as i64]).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_singular_matrix_has_zero_determinant(
        row in prop::collection::vec(-5.0f64..5.0, 2..5),
        extra in prop::collection::vec(-5.0f64..5.0, 2..5),
    ) {
        // Duplicate first row makes any square matrix singular.
        let n = row.len().min(extra.len());
        let mut data = Vec::with_capacity(n * n);
        data.extend_from_slice(&row[..n]);
        data.extend_from_slice(&row[..n]);
        for i in 2..n {
            for j in 0..n {
                data.push(extra[j] * i as f64 + j as f64);
            }
        }
        let m = Matrix::from_vec(data, n, n).unwrap();
        prop_assert!(m.determinant().unwrap().abs() < 1e-6);
    }
}

#[test]
fn test_identity_determinants() {
    for n in 1..=6 {
        let det = Matrix::identity(n).determinant().unwrap();
        assert!((det - 1.0).abs() < 1e-12, "det(I_{n}) = {det}");
    }
}
