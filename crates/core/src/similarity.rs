//! Cross-camera identity matching.
//!
//! Decides whether a new observation belongs to the same physical entity as
//! the latest observation of an existing track. The decision is a weighted
//! composite over independently optional signals: a signal only counts when
//! both observations carry the attributes it needs, and the final score is
//! normalized by the total weight of the signals that could be evaluated.
//! Zero evaluable signals means "not the same".
//!
//! Pure logic: no I/O, no wall clock. Observation timestamps are the only
//! notion of time involved.

use crate::observation::Observation;

/// Tolerance for comparing the normalized score against the threshold, so
/// that sums of decimal weights landing exactly on it still match.
const SCORE_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Relative weight of each signal in the composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalWeights {
    pub temporal: f64,
    pub spatial: f64,
    pub class_type: f64,
    pub clothing: f64,
    pub bounding_box: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            temporal: 0.25,
            spatial: 0.35,
            class_type: 0.20,
            clothing: 0.15,
            bounding_box: 0.05,
        }
    }
}

/// Tunable matching policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityConfig {
    /// Normalized score at or above which two observations match.
    pub match_threshold: f64,
    /// Time difference at which the temporal signal reaches zero.
    pub max_time_delta_secs: f64,
    /// Great-circle distance at which the spatial signal reaches zero.
    pub max_geo_distance_m: f64,
    /// Minimum IoU for the bounding-box signal to score.
    pub min_iou: f64,
    /// A class-type mismatch rejects the pair outright.
    pub class_type_veto: bool,
    pub weights: SignalWeights,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.75,
            max_time_delta_secs: 1.0,
            max_geo_distance_m: 1.5,
            min_iou: 0.2,
            class_type_veto: true,
            weights: SignalWeights::default(),
        }
    }
}

impl SimilarityConfig {
    /// Load the policy from environment variables, falling back to defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `FUSION_MATCH_THRESHOLD`     | `0.75`  |
    /// | `FUSION_MAX_TIME_DELTA_SECS` | `1.0`   |
    /// | `FUSION_MAX_GEO_DISTANCE_M`  | `1.5`   |
    /// | `FUSION_MIN_IOU`             | `0.2`   |
    /// | `FUSION_CLASS_TYPE_VETO`     | `true`  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            match_threshold: env_or("FUSION_MATCH_THRESHOLD", defaults.match_threshold),
            max_time_delta_secs: env_or(
                "FUSION_MAX_TIME_DELTA_SECS",
                defaults.max_time_delta_secs,
            ),
            max_geo_distance_m: env_or("FUSION_MAX_GEO_DISTANCE_M", defaults.max_geo_distance_m),
            min_iou: env_or("FUSION_MIN_IOU", defaults.min_iou),
            class_type_veto: env_or("FUSION_CLASS_TYPE_VETO", defaults.class_type_veto),
            weights: defaults.weights,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Signal table
// ---------------------------------------------------------------------------

/// One row of the scoring table.
///
/// `score` returns `None` when either side lacks the attributes the signal
/// needs; the signal then contributes neither score nor weight.
struct Signal {
    name: &'static str,
    weight: fn(&SignalWeights) -> f64,
    score: fn(&Observation, &Observation, &SimilarityConfig) -> Option<f64>,
    /// A zero score on this signal rejects the pair regardless of the rest.
    vetoes: fn(&SimilarityConfig) -> bool,
}

const SIGNALS: &[Signal] = &[
    Signal {
        name: "temporal",
        weight: temporal_weight,
        score: temporal_score,
        vetoes: never_vetoes,
    },
    Signal {
        name: "spatial",
        weight: spatial_weight,
        score: spatial_score,
        vetoes: never_vetoes,
    },
    Signal {
        name: "class_type",
        weight: class_type_weight,
        score: class_type_score,
        vetoes: class_type_vetoes,
    },
    Signal {
        name: "clothing",
        weight: clothing_weight,
        score: clothing_score,
        vetoes: never_vetoes,
    },
    Signal {
        name: "bounding_box",
        weight: bounding_box_weight,
        score: bounding_box_score,
        vetoes: never_vetoes,
    },
];

fn temporal_weight(w: &SignalWeights) -> f64 {
    w.temporal
}

fn spatial_weight(w: &SignalWeights) -> f64 {
    w.spatial
}

fn class_type_weight(w: &SignalWeights) -> f64 {
    w.class_type
}

fn clothing_weight(w: &SignalWeights) -> f64 {
    w.clothing
}

fn bounding_box_weight(w: &SignalWeights) -> f64 {
    w.bounding_box
}

fn never_vetoes(_: &SimilarityConfig) -> bool {
    false
}

fn class_type_vetoes(config: &SimilarityConfig) -> bool {
    config.class_type_veto
}

fn temporal_score(a: &Observation, b: &Observation, config: &SimilarityConfig) -> Option<f64> {
    let (ta, tb) = (a.timestamp?, b.timestamp?);
    let delta_secs = (tb - ta).num_microseconds()? as f64 / 1_000_000.0;
    Some((1.0 - delta_secs.abs() / config.max_time_delta_secs).max(0.0))
}

fn spatial_score(a: &Observation, b: &Observation, config: &SimilarityConfig) -> Option<f64> {
    let distance = a.position()?.distance_m(&b.position()?);
    Some((1.0 - distance / config.max_geo_distance_m).max(0.0))
}

fn class_type_score(a: &Observation, b: &Observation, _: &SimilarityConfig) -> Option<f64> {
    let (ka, kb) = (a.object_type()?, b.object_type()?);
    Some(if ka == kb { 1.0 } else { 0.0 })
}

fn clothing_score(a: &Observation, b: &Observation, _: &SimilarityConfig) -> Option<f64> {
    let (ca, cb) = (a.classification.as_ref()?, b.classification.as_ref()?);

    let slots = [
        (ca.top_upper_color(), cb.top_upper_color()),
        (ca.top_lower_color(), cb.top_lower_color()),
    ];

    let matches: Vec<f64> = slots
        .iter()
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some(if x.eq_ignore_ascii_case(y) { 1.0 } else { 0.0 }),
            _ => None,
        })
        .collect();

    if matches.is_empty() {
        return None;
    }
    Some(matches.iter().sum::<f64>() / matches.len() as f64)
}

fn bounding_box_score(a: &Observation, b: &Observation, config: &SimilarityConfig) -> Option<f64> {
    let iou = a.bounding_box?.iou(&b.bounding_box?);
    Some(if iou >= config.min_iou { 1.0 } else { 0.0 })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Outcome of one evaluable signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalScore {
    pub signal: &'static str,
    pub weight: f64,
    pub score: f64,
    pub vetoed: bool,
}

/// Per-signal scores for the signals that both observations can support.
pub fn score_breakdown(
    last: &Observation,
    candidate: &Observation,
    config: &SimilarityConfig,
) -> Vec<SignalScore> {
    SIGNALS
        .iter()
        .filter_map(|signal| {
            let weight = (signal.weight)(&config.weights);
            if weight <= 0.0 {
                return None;
            }
            let score = (signal.score)(last, candidate, config)?;
            Some(SignalScore {
                signal: signal.name,
                weight,
                score,
                vetoed: score <= 0.0 && (signal.vetoes)(config),
            })
        })
        .collect()
}

/// Normalized composite score in `[0, 1]`.
///
/// Returns `None` when no signal could be evaluated. A vetoing signal that
/// scores zero yields `Some(0.0)`.
pub fn similarity_score(
    last: &Observation,
    candidate: &Observation,
    config: &SimilarityConfig,
) -> Option<f64> {
    let breakdown = score_breakdown(last, candidate, config);
    if breakdown.iter().any(|s| s.vetoed) {
        return Some(0.0);
    }

    let total_weight: f64 = breakdown.iter().map(|s| s.weight).sum();
    if total_weight <= 0.0 {
        return None;
    }
    let weighted: f64 = breakdown.iter().map(|s| s.weight * s.score).sum();
    Some(weighted / total_weight)
}

/// Whether `candidate` is the same physical entity as `last`.
pub fn is_same_entity(last: &Observation, candidate: &Observation, config: &SimilarityConfig) -> bool {
    similarity_score(last, candidate, config)
        .is_some_and(|score| score + SCORE_EPSILON >= config.match_threshold)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
