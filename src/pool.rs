use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info};
use rayon::prelude::*;

use crate::{
    corrections::{CorrectedObservable, CorrectionEngine},
    error::Error,
    observation::ObservationRecord,
    prelude::{Carrier, Epoch, SV},
};

/// One excluded observation, with the cause of its exclusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Reception [Epoch]
    pub epoch: Epoch,
    /// [SV]
    pub sv: SV,
    /// [Carrier] signal
    pub carrier: Carrier,
    /// Exclusion cause
    pub cause: Error,
}

/// Outcome of one [CorrectionEngine::run].
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    /// Corrected observables, in (epoch, sv, carrier) order
    pub observables: Vec<CorrectedObservable>,

    /// Excluded observations, in the same order
    pub rejections: Vec<Rejection>,

    /// False when the run was cancelled before the last batch:
    /// results up to the cancellation point are still returned.
    pub complete: bool,
}

impl CorrectionEngine {
    /// Corrects a whole observation set. Observations are sorted by
    /// (epoch, sv, carrier) then processed in parallel batches of
    /// [crate::cfg::Config::batch_size]. The cancellation flag is honored
    /// between batches. Individual failures exclude the observation and
    /// are returned as [Rejection]s, unless their fraction exceeds
    /// [crate::cfg::Config::max_failure_ratio] over a completed run.
    pub fn run(
        &self,
        mut observations: Vec<ObservationRecord>,
        cancel: &AtomicBool,
    ) -> Result<Run, Error> {
        observations.sort_by(|a, b| {
            a.epoch
                .cmp(&b.epoch)
                .then(a.sv.cmp(&b.sv))
                .then(a.carrier.cmp(&b.carrier))
        });

        let total = observations.len();
        let mut observables = Vec::with_capacity(total);
        let mut rejections = Vec::new();
        let mut complete = true;

        for batch in observations.chunks(self.cfg.batch_size) {
            if cancel.load(Ordering::Relaxed) {
                info!(
                    "run cancelled: {}/{} observations processed",
                    observables.len() + rejections.len(),
                    total,
                );
                complete = false;
                break;
            }

            // one engine, many readers: correct() is a pure read
            let results: Vec<_> = batch
                .par_iter()
                .map(|obs| (obs, self.correct(obs)))
                .collect();

            for (obs, result) in results {
                match result {
                    Ok(corrected) => observables.push(corrected),
                    Err(cause) => {
                        debug!(
                            "{}({}) {} - excluded: {}",
                            obs.epoch, obs.sv, obs.carrier, cause,
                        );
                        rejections.push(Rejection {
                            epoch: obs.epoch,
                            sv: obs.sv,
                            carrier: obs.carrier,
                            cause,
                        });
                    },
                }
            }
        }

        let processed = observables.len() + rejections.len();

        if complete && processed > 0 {
            let ratio = rejections.len() as f64 / processed as f64;
            if ratio > self.cfg.max_failure_ratio {
                error!(
                    "{}/{} observations rejected: exceeds tolerated ratio {:.2}",
                    rejections.len(),
                    processed,
                    self.cfg.max_failure_ratio,
                );
                return Err(Error::FailureRatioExceeded);
            }
        }

        info!(
            "run {}: {} corrected, {} rejected",
            if complete { "complete" } else { "interrupted" },
            observables.len(),
            rejections.len(),
        );

        Ok(Run {
            observables,
            rejections,
            complete,
        })
    }
}
