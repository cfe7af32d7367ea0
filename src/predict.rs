use crate::calibrate::CalibrationModel;
use crate::distance::euclidean;
use crate::panel::{ReferencePanel, TestIndividual};
use rayon::prelude::*;

/// Upper bound on the number of reference populations interpolated per
/// individual.
pub const N_BEST: usize = 10;

/// One emitted prediction: group label, 1-based ordinal within the group,
/// sample id, label of the genetically nearest reference, and the
/// predicted coordinates. Coordinates are non-finite when the weights
/// degenerate (shared zero distance or missing profile components).
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub group: String,
    pub sample_no: usize,
    pub sample_id: String,
    pub best_population: String,
    pub long: f64,
    pub lat: f64,
}

/// Indices of the `n_best` rows nearest by distance, ascending.
///
/// Stable sort over (distance, index): equal distances resolve to the
/// lower index, NaN orders after every finite distance.
fn nearest_references(distances: &[f64], n_best: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..distances.len()).collect();
    order.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]));
    order.truncate(n_best);
    order
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Scales an axis offset so it does not exceed the geographic radius.
///
/// The denominator is the same axis twice, `sqrt(d^2 + d^2)` = |d|*sqrt(2),
/// not the joint norm of both axes. GPS has always clamped this way and
/// its numeric output is load-bearing for downstream consumers, so the
/// formula is kept verbatim.
fn clamp_to_radius(delta: f64, radius: f64) -> f64 {
    delta * (radius / (2.0 * delta * delta).sqrt()).min(1.0)
}

/// Locates one individual against the panel.
///
/// Distances are computed against every reference profile, the nearest
/// `min(N_BEST, panel.len())` are kept, and their coordinate offsets from
/// the single nearest reference are blended with quartic inverse-distance
/// weights, clamped to the calibrated geographic radius.
pub fn predict(
    panel: &ReferencePanel,
    model: &CalibrationModel,
    individual: &TestIndividual,
    sample_no: usize,
) -> PredictionResult {
    let distances: Vec<f64> = (0..panel.len())
        .map(|n| euclidean(individual.genes.view(), panel.genes().row(n)))
        .collect();

    let n_best = N_BEST.min(panel.len());
    let best = nearest_references(&distances, n_best);
    let nearest: Vec<f64> = best.iter().map(|&i| distances[i]).collect();

    let weights = relatedness_weights(&nearest);
    if !weights.iter().all(|w| w.is_finite()) {
        log::warn!(
            "sample {}: non-finite relatedness weights (zero distance to \
             several references or missing components), coordinates will \
             be non-finite",
            individual.sample_id
        );
    }

    // expected geographic radius for the nearest neighbour's genetic distance
    let radius_geo = model.coefficient * nearest[0];

    let base_lat = panel.lat(best[0]);
    let base_long = panel.long(best[0]);
    let mut delta_long = 0.0;
    let mut delta_lat = 0.0;
    for (w, &i) in weights.iter().zip(best.iter()) {
        delta_long += w * round3(panel.long(i) - base_long);
        delta_lat += w * round3(panel.lat(i) - base_lat);
    }

    PredictionResult {
        group: individual.group.clone(),
        sample_no,
        sample_id: individual.sample_id.clone(),
        best_population: panel.name(best[0]).to_string(),
        long: base_long + clamp_to_radius(delta_long, radius_geo),
        lat: base_lat + clamp_to_radius(delta_lat, radius_geo),
    }
}

/// Quartic inverse-distance weights `(d0/dj)^4`, L1-normalized.
///
/// A unique zero nearest distance takes the analytic limit: all weight on
/// the matched reference, so an exact genetic match reproduces that
/// reference's coordinates. A zero distance shared with further
/// references divides 0/0 and the resulting NaNs propagate into the
/// output row instead of aborting the run.
fn relatedness_weights(nearest: &[f64]) -> Vec<f64> {
    if nearest[0] == 0.0 && nearest.iter().skip(1).all(|&d| d > 0.0) {
        let mut weights = vec![0.0; nearest.len()];
        weights[0] = 1.0;
        return weights;
    }
    let raw: Vec<f64> = nearest.iter().map(|d| (nearest[0] / d).powi(4)).collect();
    let total: f64 = raw.iter().sum();
    raw.iter().map(|w| w / total).collect()
}

/// Runs the predictor over every individual, group by group.
///
/// Groups are taken in order of first appearance and members keep file
/// order, so the output ordering is deterministic; the per-individual work
/// is independent and runs on the rayon pool with order preserved.
pub fn predict_all(
    panel: &ReferencePanel,
    model: &CalibrationModel,
    individuals: &[TestIndividual],
) -> Vec<PredictionResult> {
    let jobs = grouped_order(individuals);
    jobs.par_iter()
        .map(|&(i, sample_no)| predict(panel, model, &individuals[i], sample_no))
        .collect()
}

/// (individual index, 1-based ordinal within group), group-major.
fn grouped_order(individuals: &[TestIndividual]) -> Vec<(usize, usize)> {
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (i, individual) in individuals.iter().enumerate() {
        match groups.iter_mut().find(|(g, _)| *g == individual.group) {
            Some((_, members)) => members.push(i),
            None => groups.push((&individual.group, vec![i])),
        }
    }
    groups
        .into_iter()
        .flat_map(|(_, members)| {
            members
                .into_iter()
                .enumerate()
                .map(|(m, i)| (i, m + 1))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{load_individuals, ReferencePanel, N_COMPONENTS};
    use ndarray::Array1;

    fn three_population_panel() -> ReferencePanel {
        let geo = "POPULATION,Lat,Long\nA,0.0,0.0\nB,10.0,10.0\nC,-10.0,-10.0\n";
        let gen = "A,0,0,0,0,0,0,0,0,0\n\
                   B,1,1,1,1,1,1,1,1,1\n\
                   C,2,2,2,2,2,2,2,2,2\n";
        ReferencePanel::from_readers(geo.as_bytes(), gen.as_bytes()).unwrap()
    }

    fn individual(genes: [f64; N_COMPONENTS]) -> TestIndividual {
        TestIndividual {
            sample_id: "S1".into(),
            group: "G1".into(),
            genes: Array1::from(genes.to_vec()),
        }
    }

    fn model() -> CalibrationModel {
        CalibrationModel {
            coefficient: 25.0,
            intercept: 0.0,
        }
    }

    #[test]
    fn exact_match_predicts_the_reference_coordinates() {
        let panel = three_population_panel();
        let result = predict(&panel, &model(), &individual([0.0; 9]), 1);
        assert_eq!(result.best_population, "A");
        assert_eq!(result.long, 0.0);
        assert_eq!(result.lat, 0.0);
        assert_eq!(result.sample_no, 1);
    }

    #[test]
    fn prediction_is_the_nearest_reference_label() {
        let panel = three_population_panel();
        let result = predict(&panel, &model(), &individual([1.9; 9]), 1);
        assert_eq!(result.best_population, "C");
    }

    #[test]
    fn weights_sum_to_one() {
        let weights = relatedness_weights(&[0.5, 1.0, 2.0]);
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(weights[0] > weights[1] && weights[1] > weights[2]);
    }

    #[test]
    fn shared_zero_distance_degenerates_to_nan() {
        let weights = relatedness_weights(&[0.0, 0.0, 1.0]);
        assert!(weights.iter().all(|w| w.is_nan()));

        let geo = "POPULATION,Lat,Long\nA,0.0,0.0\nB,5.0,5.0\nC,9.0,9.0\n";
        let gen = "A,0,0,0,0,0,0,0,0,0\n\
                   B,0,0,0,0,0,0,0,0,0\n\
                   C,1,1,1,1,1,1,1,1,1\n";
        let panel = ReferencePanel::from_readers(geo.as_bytes(), gen.as_bytes()).unwrap();
        let result = predict(&panel, &model(), &individual([0.0; 9]), 1);
        // the run does not abort; the degenerate row carries NaN
        assert_eq!(result.best_population, "A");
        assert!(result.long.is_nan());
        assert!(result.lat.is_nan());
    }

    #[test]
    fn missing_components_propagate_as_non_finite() {
        let panel = three_population_panel();
        let mut genes = [0.2; 9];
        genes[3] = f64::NAN;
        let result = predict(&panel, &model(), &individual(genes), 1);
        assert!(result.long.is_nan());
        assert!(result.lat.is_nan());
    }

    #[test]
    fn ties_resolve_to_the_lowest_reference_index() {
        // B and C equidistant from the probe; the stable order keeps B first
        let geo = "POPULATION,Lat,Long\nA,0.0,0.0\nB,10.0,10.0\nC,-10.0,-10.0\n";
        let gen = "A,9,9,9,9,9,9,9,9,9\n\
                   B,1,1,1,1,1,1,1,1,1\n\
                   C,3,3,3,3,3,3,3,3,3\n";
        let panel = ReferencePanel::from_readers(geo.as_bytes(), gen.as_bytes()).unwrap();
        let result = predict(&panel, &model(), &individual([2.0; 9]), 1);
        assert_eq!(result.best_population, "B");
    }

    #[test]
    fn n_best_never_exceeds_the_panel() {
        let distances = vec![3.0, 1.0, 2.0];
        let best = nearest_references(&distances, N_BEST.min(distances.len()));
        assert_eq!(best, vec![1, 2, 0]);
    }

    #[test]
    fn clamp_uses_the_single_axis_denominator() {
        // scale = radius / (|d| * sqrt(2)); with d = 4 and radius = 2 the
        // offset shrinks to 2 / sqrt(2), not to the joint-norm value
        let clamped = clamp_to_radius(4.0, 2.0);
        assert!((clamped - 2.0 / f64::sqrt(2.0)).abs() < 1e-12);
        // inside the radius the offset is untouched
        assert_eq!(clamp_to_radius(0.5, 2.0), 0.5);
        // zero offset stays zero even with a zero radius
        assert_eq!(clamp_to_radius(0.0, 0.0), 0.0);
    }

    #[test]
    fn offsets_are_rounded_before_weighting() {
        assert_eq!(round3(1.23456), 1.235);
        assert_eq!(round3(-0.0004), -0.0);
    }

    #[test]
    fn groups_run_in_first_appearance_order() {
        let data = "SAMPLE_ID,C1,C2,C3,C4,C5,C6,C7,C8,C9,GROUP_ID\n\
                    S1,0,0,0,0,0,0,0,0,0,G2\n\
                    S2,0,0,0,0,0,0,0,0,0,G1\n\
                    S3,0,0,0,0,0,0,0,0,0,G2\n";
        let individuals = load_individuals(data.as_bytes()).unwrap();
        let order = grouped_order(&individuals);
        assert_eq!(order, vec![(0, 1), (2, 2), (1, 1)]);
    }

    #[test]
    fn parallel_order_matches_input_contract() {
        let panel = three_population_panel();
        let data = "SAMPLE_ID,C1,C2,C3,C4,C5,C6,C7,C8,C9,GROUP_ID\n\
                    S1,0,0,0,0,0,0,0,0,0,G2\n\
                    S2,1,1,1,1,1,1,1,1,1,G1\n\
                    S3,2,2,2,2,2,2,2,2,2,G2\n";
        let individuals = load_individuals(data.as_bytes()).unwrap();
        let results = predict_all(&panel, &model(), &individuals);
        let order: Vec<(&str, usize, &str)> = results
            .iter()
            .map(|r| (r.group.as_str(), r.sample_no, r.sample_id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("G2", 1, "S1"), ("G2", 2, "S3"), ("G1", 1, "S2")]
        );
    }
}
