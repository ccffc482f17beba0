//! Model selection — score every candidate by cross-validation, keep the best.
//!
//! 1. Refuse to train below `min_samples` labeled rows.
//! 2. Seeded random train/held-out split.
//! 3. Stratified k-fold CV of each candidate on the training portion.
//! 4. Failed candidates score 0 and are left out of the ranking.
//! 5. The top `ensemble_size` are refit on the full training portion and
//!    combined by soft voting.
//!
//! Every random stream is derived from `(seed, candidate, fold)`, so the
//! parallel and sequential runs produce the same scores.

use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use predictlab_core::labels::LabeledTable;
use predictlab_core::models::{accuracy, CandidateKind, Classifier, ModelConfig, ModelError};
use predictlab_core::rng::SeedTree;

use crate::config::SelectionConfig;
use crate::ensemble::{MemberSpec, SoftVotingEnsemble};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("insufficient data: {available} labeled rows, at least {required} required")]
    InsufficientData { available: usize, required: usize },

    #[error("no ensemble member could be fitted: {}", failures.join("; "))]
    EnsembleFit { failures: Vec<String> },

    #[error("held-out prediction failed: {0}")]
    Holdout(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    Scored { fold_scores: Vec<f64> },
    Failed { reason: String },
}

/// One algorithm's cross-validation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub kind: CandidateKind,
    /// Mean fold accuracy in [0, 1]; 0 when the candidate failed.
    pub score: f64,
    pub outcome: CandidateOutcome,
}

impl ModelCandidate {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, CandidateOutcome::Scored { .. })
    }
}

/// Output of [`select_and_fit`].
#[derive(Debug, Clone)]
pub struct Selection {
    /// Every candidate in registration order.
    pub candidates: Vec<ModelCandidate>,
    pub ensemble: SoftVotingEnsemble,
    /// Candidates that were ranked into the ensemble but failed their final fit.
    pub member_failures: Vec<String>,
    /// Ensemble accuracy on the held-out rows.
    pub holdout_accuracy: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

impl Selection {
    /// Candidate name → score, registration order.
    pub fn scores(&self) -> Vec<(String, f64)> {
        self.candidates
            .iter()
            .map(|c| (c.name().to_string(), c.score))
            .collect()
    }
}

/// Shuffle `0..n` with `seed` and hold out the first `ceil(n × test_fraction)`.
///
/// Returns `(train, test)`, each sorted ascending.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = SeedTree::new(seed).rng_for("split", 0);
    order.shuffle(&mut rng);

    let test_len = ((n as f64 * test_fraction).ceil() as usize).min(n);
    let mut test = order[..test_len].to_vec();
    let mut train = order[test_len..].to_vec();
    test.sort_unstable();
    train.sort_unstable();
    (train, test)
}

/// Assign each position of `labels` to one of `k` folds.
///
/// Class 0 rows are dealt round-robin first, class 1 rows continue the same
/// counter, so every fold gets a near-equal share of each class and the fold
/// sizes differ by at most one. Returns the held-out positions per fold.
pub fn stratified_folds(labels: &[u8], k: usize) -> Vec<Vec<usize>> {
    let k = k.max(1);
    let mut folds = vec![Vec::new(); k];
    let mut next = 0;
    for class in [0u8, 1] {
        for (pos, _) in labels.iter().enumerate().filter(|(_, &l)| l == class) {
            folds[next % k].push(pos);
            next += 1;
        }
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    folds
}

fn gather<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

fn cross_validate(
    kind: CandidateKind,
    x: &[Vec<f64>],
    y: &[u8],
    folds: &[Vec<usize>],
    models: &ModelConfig,
    seeds: &SeedTree,
) -> ModelCandidate {
    let scope = format!("{}/fold", kind.name());
    let mut fold_scores = Vec::with_capacity(folds.len());

    for (f, held_out) in folds.iter().enumerate() {
        if held_out.is_empty() {
            continue;
        }
        let mut in_fold = vec![false; y.len()];
        for &i in held_out {
            in_fold[i] = true;
        }
        let train_idx: Vec<usize> = (0..y.len()).filter(|&i| !in_fold[i]).collect();

        let mut model = kind.build(models, seeds.sub_seed(&scope, f as u64));
        let result = model
            .fit(&gather(x, &train_idx), &gather(y, &train_idx))
            .and_then(|()| model.predict(&gather(x, held_out)));

        match result {
            Ok(predicted) => {
                let score = accuracy(&predicted, &gather(y, held_out));
                debug!(candidate = kind.name(), fold = f, score, "fold scored");
                fold_scores.push(score);
            }
            Err(e) => {
                warn!(candidate = kind.name(), fold = f, error = %e, "candidate failed");
                return ModelCandidate {
                    kind,
                    score: 0.0,
                    outcome: CandidateOutcome::Failed {
                        reason: format!("fold {f}: {e}"),
                    },
                };
            }
        }
    }

    if fold_scores.is_empty() {
        warn!(candidate = kind.name(), "no non-empty folds");
        return ModelCandidate {
            kind,
            score: 0.0,
            outcome: CandidateOutcome::Failed {
                reason: "no non-empty folds".into(),
            },
        };
    }

    let score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
    ModelCandidate {
        kind,
        score,
        outcome: CandidateOutcome::Scored { fold_scores },
    }
}

/// Rank candidates, fit the top ones, and wrap them in a soft-voting ensemble.
pub fn select_and_fit(
    labeled: &LabeledTable,
    config: &SelectionConfig,
    models: &ModelConfig,
) -> Result<Selection, SelectionError> {
    let n = labeled.len();
    let required = config.min_samples.max(2);
    if n < required {
        return Err(SelectionError::InsufficientData {
            available: n,
            required,
        });
    }

    let x = labeled.features().matrix();
    let y = labeled.targets();
    let (train, test) = train_test_split(n, config.test_fraction, config.seed);
    let x_train = gather(&x, &train);
    let y_train = gather(y, &train);
    let folds = stratified_folds(&y_train, config.cv_folds);
    let seeds = SeedTree::new(config.seed);

    info!(
        rows = n,
        train = train.len(),
        test = test.len(),
        folds = folds.len(),
        parallel = config.parallel,
        "model selection started"
    );

    let score = |kind: &CandidateKind| {
        cross_validate(*kind, &x_train, &y_train, &folds, models, &seeds)
    };
    let candidates: Vec<ModelCandidate> = if config.parallel {
        CandidateKind::ALL.par_iter().map(score).collect()
    } else {
        CandidateKind::ALL.iter().map(score).collect()
    };

    let mut ranked: Vec<&ModelCandidate> = candidates.iter().filter(|c| c.succeeded()).collect();
    // stable: equal scores keep registration order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let specs: Vec<MemberSpec> = ranked
        .iter()
        .take(config.ensemble_size)
        .map(|c| MemberSpec {
            kind: c.kind,
            seed: seeds.sub_seed(&format!("{}/final", c.kind.name()), 0),
        })
        .collect();
    let mut ensemble = SoftVotingEnsemble::new(models.clone(), specs);

    if ensemble.fit(&x_train, &y_train).is_err() {
        let mut failures: Vec<String> = candidates
            .iter()
            .filter_map(|c| match &c.outcome {
                CandidateOutcome::Failed { reason } => Some(format!("{}: {reason}", c.name())),
                CandidateOutcome::Scored { .. } => None,
            })
            .collect();
        failures.extend_from_slice(ensemble.failures());
        return Err(SelectionError::EnsembleFit { failures });
    }
    let member_failures = ensemble.failures().to_vec();

    let predicted = ensemble.predict(&gather(&x, &test))?;
    let holdout_accuracy = accuracy(&predicted, &gather(y, &test));

    info!(
        members = ?ensemble.member_names(),
        holdout_accuracy,
        "ensemble fitted"
    );

    Ok(Selection {
        candidates,
        ensemble,
        member_failures,
        holdout_accuracy,
        train_rows: train.len(),
        test_rows: test.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use predictlab_core::domain::PriceFrame;
    use predictlab_core::features::{add_indicators, FeatureConfig};
    use predictlab_core::labels::{add_target, LabelConfig};
    use predictlab_core::PriceBar;

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: base + Duration::hours(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0 + (i % 5) as f64 * 50.0,
            })
            .collect()
    }

    fn labeled(closes: &[f64]) -> LabeledTable {
        let frame = PriceFrame::from_bars(&bars(closes));
        let table = add_indicators(&frame, &FeatureConfig::default()).unwrap();
        add_target(&table, closes, &LabelConfig::default()).unwrap()
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + (i as f64 * 1.3).cos())
            .collect()
    }

    fn fast_models() -> ModelConfig {
        let mut models = ModelConfig::default();
        models.random_forest.n_trees = 10;
        models.gradient_boosting.n_estimators = 10;
        models.regularized_boosting.n_estimators = 10;
        models.logistic.max_iter = 100;
        models
    }

    #[test]
    fn split_sizes_and_disjointness() {
        let (train, test) = train_test_split(101, 0.2, 42);
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_seeded() {
        assert_eq!(train_test_split(60, 0.2, 7), train_test_split(60, 0.2, 7));
        assert_ne!(train_test_split(60, 0.2, 7).1, train_test_split(60, 0.2, 8).1);
    }

    #[test]
    fn folds_are_stratified_and_cover_everything() {
        let labels: Vec<u8> = (0..23).map(|i| u8::from(i % 3 == 0)).collect();
        let folds = stratified_folds(&labels, 5);
        assert_eq!(folds.len(), 5);
        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        assert!(sizes.iter().max().unwrap() - sizes.iter().min().unwrap() <= 1);
        let positives: Vec<usize> = folds
            .iter()
            .map(|f| f.iter().filter(|&&i| labels[i] == 1).count())
            .collect();
        assert!(positives.iter().max().unwrap() - positives.iter().min().unwrap() <= 1);
        let mut all: Vec<usize> = folds.concat();
        all.sort_unstable();
        assert_eq!(all, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn too_few_rows_refused_before_training() {
        let table = labeled(&wavy(60));
        assert!(table.len() < 50);
        let err = select_and_fit(&table, &SelectionConfig::default(), &fast_models()).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::InsufficientData { required: 50, .. }
        ));
    }

    #[test]
    fn mixed_labels_score_every_candidate() {
        let table = labeled(&wavy(300));
        let selection =
            select_and_fit(&table, &SelectionConfig::default(), &fast_models()).unwrap();
        assert_eq!(selection.candidates.len(), 4);
        for c in &selection.candidates {
            assert!(c.succeeded(), "{} failed: {:?}", c.name(), c.outcome);
            assert!((0.0..=1.0).contains(&c.score));
        }
        assert_eq!(selection.ensemble.len(), 3);
        assert!((0.0..=1.0).contains(&selection.holdout_accuracy));
        assert_eq!(selection.train_rows + selection.test_rows, table.len());
    }

    #[test]
    fn single_class_keeps_forest_only() {
        let closes: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        let table = labeled(&closes);
        assert!(table.targets().iter().all(|&t| t == 1));

        let selection =
            select_and_fit(&table, &SelectionConfig::default(), &fast_models()).unwrap();
        assert_eq!(selection.ensemble.member_names(), vec!["random_forest"]);
        let failed: Vec<&str> = selection
            .candidates
            .iter()
            .filter(|c| !c.succeeded())
            .map(|c| c.name())
            .collect();
        assert_eq!(failed, ["gradient_boosting", "logistic", "regularized_boosting"]);
        assert!(selection
            .candidates
            .iter()
            .filter(|c| !c.succeeded())
            .all(|c| c.score == 0.0));
    }

    #[test]
    fn parallel_matches_sequential() {
        let table = labeled(&wavy(200));
        let sequential = SelectionConfig::default();
        let parallel = SelectionConfig {
            parallel: true,
            ..SelectionConfig::default()
        };
        let a = select_and_fit(&table, &sequential, &fast_models()).unwrap();
        let b = select_and_fit(&table, &parallel, &fast_models()).unwrap();
        assert_eq!(a.candidates, b.candidates);
        assert_eq!(a.holdout_accuracy, b.holdout_accuracy);
    }

    #[test]
    fn ensemble_size_caps_members() {
        let table = labeled(&wavy(200));
        let config = SelectionConfig {
            ensemble_size: 1,
            ..SelectionConfig::default()
        };
        let selection = select_and_fit(&table, &config, &fast_models()).unwrap();
        assert_eq!(selection.ensemble.len(), 1);
        let best = selection
            .candidates
            .iter()
            .filter(|c| c.succeeded())
            .fold(None::<&ModelCandidate>, |best, c| match best {
                Some(b) if b.score >= c.score => Some(b),
                _ => Some(c),
            })
            .unwrap();
        assert_eq!(selection.ensemble.member_names(), vec![best.name()]);
    }

    #[test]
    fn ensemble_refit_on_training_rows_is_reproducible() {
        let table = labeled(&wavy(200));
        let config = SelectionConfig::default();
        let selection = select_and_fit(&table, &config, &fast_models()).unwrap();

        let members: Vec<CandidateKind> =
            selection.ensemble.specs().iter().map(|s| s.kind).collect();
        assert_eq!(
            selection.ensemble.member_names(),
            members.iter().map(|k| k.name()).collect::<Vec<_>>()
        );

        let x = table.features().matrix();
        let (train, _) = train_test_split(table.len(), config.test_fraction, config.seed);
        let mut refit = selection.ensemble.clone();
        refit
            .fit(&gather(&x, &train), &gather(table.targets(), &train))
            .unwrap();
        assert_eq!(
            refit.predict_proba(&x).unwrap(),
            selection.ensemble.predict_proba(&x).unwrap()
        );
    }
}
