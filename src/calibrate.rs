/// Pairs whose geographic distance reaches this bound are suppressed
/// before the regression.
pub const MAX_GEO_DISTANCE: f64 = 70.0;

/// Pairs whose genetic distance reaches this bound are suppressed before
/// the regression.
pub const MAX_GENE_DISTANCE: f64 = 0.8;

/// Linear relation between genetic and geographic distance over the
/// reference panel. Fit once per run; `coefficient` converts a genetic
/// distance into an expected geographic radius. The intercept is part of
/// the fit but plays no role in prediction.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationModel {
    pub coefficient: f64,
    pub intercept: f64,
}

/// Zeroes outlier pairs in place: wherever the geographic distance is
/// `>= MAX_GEO_DISTANCE` or the genetic distance is `>= MAX_GENE_DISTANCE`,
/// both paired values become 0. Entries are never removed, so positional
/// indexing and the input length survive the filter; the zeroed pairs pull
/// the fit toward the origin, matching the ancestral GPS tool.
pub fn suppress_outliers(gene: &mut [f64], geo: &mut [f64]) {
    for (x, y) in gene.iter_mut().zip(geo.iter_mut()) {
        if *y >= MAX_GEO_DISTANCE || *x >= MAX_GENE_DISTANCE {
            *x = 0.0;
            *y = 0.0;
        }
    }
}

/// Ordinary least squares of geographic distance on genetic distance over
/// all reference-population pairs (self-pairs and zeroed outliers
/// included).
pub fn fit(gene_distances: &[f64], geo_distances: &[f64]) -> CalibrationModel {
    assert_eq!(gene_distances.len(), geo_distances.len());

    let mut gene = gene_distances.to_vec();
    let mut geo = geo_distances.to_vec();
    suppress_outliers(&mut gene, &mut geo);

    let n = gene.len() as f64;
    let mean_x = gene.iter().sum::<f64>() / n;
    let mean_y = geo.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in gene.iter().zip(geo.iter()) {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }

    // Zero genetic variance (every pair suppressed) resolves to a zero
    // slope, the least-squares pseudo-inverse solution; prediction then
    // clamps every offset to a zero radius.
    let coefficient = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    CalibrationModel {
        coefficient,
        intercept: mean_y - coefficient * mean_x,
    }
}
