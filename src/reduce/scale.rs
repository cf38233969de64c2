// Per-column standardization.

/// Scale every column to zero mean and unit variance (population variance).
/// Columns with no spread become all zeros.
pub fn standardize(points: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let dim = first.len();
    let n = points.len() as f64;

    let mut mean = vec![0.0f64; dim];
    for p in points {
        for (m, &v) in mean.iter_mut().zip(p) {
            *m += v as f64;
        }
    }
    mean.iter_mut().for_each(|m| *m /= n);

    let mut var = vec![0.0f64; dim];
    for p in points {
        for ((s, &v), m) in var.iter_mut().zip(p).zip(&mean) {
            let d = v as f64 - m;
            *s += d * d;
        }
    }
    let std: Vec<f64> = var.iter().map(|s| (s / n).sqrt()).collect();

    points
        .iter()
        .map(|p| {
            p.iter()
                .zip(mean.iter().zip(&std))
                .map(|(&v, (m, s))| {
                    if *s > f64::EPSILON {
                        ((v as f64 - m) / s) as f32
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}
