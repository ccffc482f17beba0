//! Soft-voting ensemble over the selected candidates.

use std::sync::Arc;

use tracing::warn;

use predictlab_core::models::{CandidateKind, Classifier, ModelConfig, ModelError};

/// How to rebuild one member: its algorithm and the seed for its final fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberSpec {
    pub kind: CandidateKind,
    pub seed: u64,
}

/// Averages the members' P(label = 1).
///
/// The ensemble owns its member recipes. `fit` rebuilds every member from its
/// recipe and trains it on the given rows; members whose fit fails are left
/// out and listed in `failures()`. The fit succeeds while at least one member
/// trains. Fitted members are shared read-only.
#[derive(Debug, Clone)]
pub struct SoftVotingEnsemble {
    models: ModelConfig,
    specs: Vec<MemberSpec>,
    members: Vec<Arc<dyn Classifier>>,
    failures: Vec<String>,
}

impl SoftVotingEnsemble {
    /// An unfitted ensemble over `specs`, in voting order.
    pub fn new(models: ModelConfig, specs: Vec<MemberSpec>) -> Self {
        Self {
            models,
            specs,
            members: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn specs(&self) -> &[MemberSpec] {
        &self.specs
    }

    /// Members that trained in the last `fit`.
    pub fn members(&self) -> &[Arc<dyn Classifier>] {
        &self.members
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name().to_string()).collect()
    }

    /// `"{name}: {error}"` for each member the last `fit` dropped.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Classifier for SoftVotingEnsemble {
    fn name(&self) -> &str {
        "soft_voting"
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[u8]) -> Result<(), ModelError> {
        self.members.clear();
        self.failures.clear();
        let mut last_error = ModelError::NotFitted;

        for spec in &self.specs {
            let mut model = spec.kind.build(&self.models, spec.seed);
            match model.fit(features, labels) {
                Ok(()) => self.members.push(Arc::from(model)),
                Err(e) => {
                    warn!(member = spec.kind.name(), error = %e, "ensemble member failed to fit");
                    self.failures.push(format!("{}: {e}", spec.kind.name()));
                    last_error = e;
                }
            }
        }

        if self.members.is_empty() {
            return Err(last_error);
        }
        Ok(())
    }

    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if self.members.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let mut sum = vec![0.0; features.len()];
        for member in &self.members {
            for (acc, p) in sum.iter_mut().zip(member.predict_proba(features)?) {
                *acc += p;
            }
        }
        let n = self.members.len() as f64;
        Ok(sum.into_iter().map(|s| (s / n).clamp(0.0, 1.0)).collect())
    }
}
