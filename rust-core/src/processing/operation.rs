//! Operator catalogue and selection-driven invocation

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::progress::{Progress, ProgressSteps};
use super::window::WindowedOperator;
use crate::data::{Orientation, Payload, Selection, WorkspaceRegistry};
use crate::error::{Result, WorkbenchError};
use crate::filters::{detrend, lfilter, DetrendKind, IirDesign};
use crate::spectrum::{cwt_magnitude, stft_magnitude, CwtConfig, StftConfig};

/// Every operator that can turn a list of channel series into new payloads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    /// Single-pass IIR filter designed for the workspace rate
    Filter(IirDesign),

    /// Windowize-then-fill reduction
    Windowed(WindowedOperator),

    /// 1 where a sample is strictly above the value, else 0
    Threshold { value: f64 },

    Detrend { kind: DetrendKind },

    /// Short-time Fourier magnitude
    Stft(StftConfig),

    /// Ricker continuous wavelet magnitude
    Cwt(CwtConfig),
}

/// What to do when the output signal name is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Remove the existing signal, then add the new one
    #[default]
    Replace,

    /// Refuse and leave the workspace untouched
    Reject,
}

impl Operation {
    /// Default output signal name
    pub fn name(&self) -> String {
        match self {
            Operation::Filter(design) => format!("{:?} {:?}", design.family, design.band),
            Operation::Windowed(op) => format!("{} ({} samples)", op.reduction.name(), op.window),
            Operation::Threshold { value } => format!("Threshold ({})", value),
            Operation::Detrend { kind } => format!("Detrend ({:?})", kind),
            Operation::Stft(_) => "STFT".to_string(),
            Operation::Cwt(_) => "CWT".to_string(),
        }
    }

    /// Run over every input series
    ///
    /// # Arguments
    /// * `inputs` - One series per channel
    /// * `sample_rate` - Workspace rate; required by filters and the STFT
    /// * `progress` - Receives a percentage after each channel
    ///
    /// # Returns
    /// One payload per input, in input order
    pub fn apply(
        &self,
        inputs: &[&Array1<f64>],
        sample_rate: Option<f64>,
        progress: &mut dyn Progress,
    ) -> Result<Vec<Payload>> {
        let require_rate = || {
            sample_rate.ok_or_else(|| {
                WorkbenchError::invalid("sampling rate is not set for this workspace")
            })
        };

        // Design once, outside the per-channel loop
        let transfer = match self {
            Operation::Filter(design) => Some(design.design(require_rate()?)?),
            _ => None,
        };
        if let Operation::Stft(_) = self {
            require_rate()?;
        }

        let mut steps = ProgressSteps::new(inputs.len());
        let mut outputs = Vec::with_capacity(inputs.len());

        for series in inputs {
            let samples = series.to_vec();
            let payload = match self {
                Operation::Filter(_) => match &transfer {
                    Some(tf) => Payload::from(lfilter(tf, &samples)?),
                    None => return Err(WorkbenchError::invalid("filter was not designed")),
                },
                Operation::Windowed(op) => Payload::from(op.apply(&samples)),
                Operation::Threshold { value } => Payload::from(
                    samples
                        .iter()
                        .map(|&x| if x > *value { 1.0 } else { 0.0 })
                        .collect::<Vec<f64>>(),
                ),
                Operation::Detrend { kind } => Payload::from(detrend(&samples, *kind)),
                Operation::Stft(config) => {
                    Payload::from(stft_magnitude(&samples, require_rate()?, config)?)
                }
                Operation::Cwt(config) => Payload::from(cwt_magnitude(&samples, config)?),
            };
            outputs.push(payload);
            steps.advance(progress);
        }

        log::debug!("{} produced {} payloads", self.name(), outputs.len());
        Ok(outputs)
    }
}

/// Run `operation` on the first (workspace, signal, channels) triple of
/// `selection` and store the result as `output_name` in the same workspace
///
/// Selection keys are signals (`{workspace: {signal: [channels]}}`). Channels
/// without a 1-D series under the signal are skipped; the output covers
/// exactly the channels that were processed.
///
/// # Returns
/// Workspace and channels of the new signal
pub fn process_selection(
    registry: &mut WorkspaceRegistry<Payload>,
    selection: &Selection,
    operation: &Operation,
    output_name: &str,
    on_conflict: OnConflict,
    progress: &mut dyn Progress,
) -> Result<(String, Vec<String>)> {
    let (workspace, signal, channels) = selection.first().ok_or(WorkbenchError::EmptySelection)?;
    let workspace = workspace.to_string();
    let signal = signal.to_string();
    let channels = channels.to_vec();

    let store = registry.store(&workspace)?;
    if !store.has_signal(&signal) {
        return Err(WorkbenchError::UnknownSignal { workspace, signal });
    }
    let exists = store.has_signal(output_name);
    if exists && on_conflict == OnConflict::Reject {
        return Err(WorkbenchError::SignalExists(output_name.to_string()));
    }

    let sample_rate = store.sampling_rate();
    let single = Selection::new().with(&workspace, &signal, &channels);
    let (used, outputs) = {
        let projected = registry.get_data(&single, Orientation::BySignal);
        let entries = projected
            .first()
            .and_then(|ws| ws.entries.first())
            .map(|p| p.entries.as_slice())
            .unwrap_or(&[]);

        let mut used = Vec::new();
        let mut series = Vec::new();
        for (channel, payload) in entries {
            match payload.as_series() {
                Some(s) => {
                    used.push(channel.clone());
                    series.push(s);
                }
                None => log::warn!(
                    "'{}' on {} is not a 1-D series, skipped",
                    signal,
                    channel
                ),
            }
        }
        if series.is_empty() {
            return Err(WorkbenchError::EmptySelection);
        }
        (used, operation.apply(&series, sample_rate, progress)?)
    };

    if exists {
        registry.remove_signal(&workspace, output_name)?;
    }
    registry.add_signal(&workspace, output_name, outputs, &used)?;
    log::info!(
        "{} on '{}/{}' stored as '{}' ({} channels)",
        operation.name(),
        workspace,
        signal,
        output_name,
        used.len()
    );
    Ok((workspace, used))
}
