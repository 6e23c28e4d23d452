//! Adaptive-threshold spike detector
//!
//! Per channel: optional DC removal, optional mains band-stop, band-pass,
//! windowed peak-to-peak, then a comparison of every window against the
//! channel mean and against the mean of the trailing baseline windows.

use std::path::PathBuf;

use ndarray::Array1;

use super::export::{export_rates, ExportOutcome};
use super::params::SpikeParameters;
use crate::config::WorkbenchConfig;
use crate::data::{Orientation, Payload, Selection, WorkspaceKind, WorkspaceRegistry};
use crate::error::{Result, WorkbenchError};
use crate::filters::{detrend, lfilter, DetrendKind, FilterBand, IirDesign, TransferFunction};
use crate::processing::{fill_back, Progress, ProgressSteps, Reduction, WindowedOperator};

pub const INPUT_SIGNAL: &str = "Input Signal";
pub const BPF_SIGNAL: &str = "BPF";
pub const PEAK_TO_PEAK_SIGNAL: &str = "BPF+Window+Peak-to-peak";
pub const MASK_SIGNAL: &str = "BPF+Threshold - Spikes";

/// Intermediate and final arrays of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAnalysis {
    /// Series after offset and supply removal
    pub input: Vec<f64>,

    /// Band-passed series
    pub bandpassed: Vec<f64>,

    /// One peak-to-peak value per whole window
    pub peak_to_peak: Vec<f64>,

    /// 1.0 for spike windows, 0.0 otherwise, one value per window
    pub spikes: Vec<f64>,

    /// `sum(filled mask) / window`, i.e. the number of spike windows
    pub rate: f64,
}

/// What a detector run produced and where it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeReport {
    /// Source workspace and signal
    pub source: (String, String),

    /// Processed channels, in selection order
    pub channels: Vec<String>,

    /// Spike rate per channel (the rate map)
    pub rates: Vec<f64>,

    /// Workspace and signal holding the binary mask
    pub mask: (String, String),

    /// Parameters the run used
    pub parameters: SpikeParameters,

    pub export: ExportOutcome,
}

/// Fixed pipeline settings that do not change between runs
#[derive(Debug, Clone)]
pub struct SpikeDetector {
    pub supply_band: [f64; 2],
    pub supply_order: usize,
    pub bandpass_order: usize,
    pub output_workspace: String,

    /// Directory for the rate CSV; `None` disables the export
    pub export_directory: Option<PathBuf>,
}

impl Default for SpikeDetector {
    fn default() -> Self {
        Self::from_config(&WorkbenchConfig::default())
    }
}

/// Mark windows exceeding both the channel level and the trailing baseline
///
/// Windows before `prev_windows` are always 0, as is every window when
/// `prev_windows == 0` (no baseline to compare against).
///
/// # Arguments
/// * `peak_to_peak` - One value per window
/// * `channel_level` - `hmt_larger_mean * mean(input)`
/// * `prev_windows` - Baseline length in windows
/// * `hmt_larger` - Required ratio over the baseline mean
pub fn adaptive_threshold(
    peak_to_peak: &[f64],
    channel_level: f64,
    prev_windows: usize,
    hmt_larger: f64,
) -> Vec<f64> {
    let mut mask = vec![0.0; peak_to_peak.len()];
    if prev_windows == 0 {
        return mask;
    }

    for i in prev_windows..peak_to_peak.len() {
        let value = peak_to_peak[i];
        if value > channel_level {
            let baseline = &peak_to_peak[i - prev_windows..i];
            let baseline_mean = baseline.iter().sum::<f64>() / prev_windows as f64;
            if value > hmt_larger * baseline_mean {
                mask[i] = 1.0;
            }
        }
    }
    mask
}

impl SpikeDetector {
    pub fn from_config(config: &WorkbenchConfig) -> Self {
        Self {
            supply_band: config.supply_band,
            supply_order: config.supply_filter_order,
            bandpass_order: config.bandpass_order,
            output_workspace: config.output_workspace.clone(),
            export_directory: if config.export.enabled {
                Some(config.export.directory.clone())
            } else {
                None
            },
        }
    }

    fn filters(&self, params: &SpikeParameters, fs: f64) -> Result<(Option<TransferFunction>, TransferFunction)> {
        let supply = if params.remove_supply {
            let band = FilterBand::Bandstop(self.supply_band[0], self.supply_band[1]);
            Some(IirDesign::butterworth(self.supply_order, band).design(fs)?)
        } else {
            None
        };
        let bandpass = IirDesign::butterworth(
            self.bandpass_order,
            FilterBand::Bandpass(params.bpf_lowcut, params.bpf_highcut),
        )
        .design(fs)?;
        Ok((supply, bandpass))
    }

    /// Run the numeric pipeline over in-memory channels
    ///
    /// # Arguments
    /// * `channels` - One series per channel
    /// * `fs` - Sampling rate in Hz
    /// * `params` - Detector parameters
    /// * `progress` - Receives a percentage after each channel
    pub fn analyze(
        &self,
        channels: &[&[f64]],
        fs: f64,
        params: &SpikeParameters,
        progress: &mut dyn Progress,
    ) -> Result<Vec<ChannelAnalysis>> {
        params.validate()?;
        let (supply, bandpass) = self.filters(params, fs)?;
        let windowed = WindowedOperator::new(Reduction::PeakToPeak, params.window)?;
        let prev_windows = params.prev_windows(fs);
        if prev_windows == 0 {
            log::warn!(
                "baseline of {} s spans no whole {}-sample window, no spikes can be marked",
                params.prev_seconds,
                params.window
            );
        }

        let mut steps = ProgressSteps::new(channels.len());
        let mut results = Vec::with_capacity(channels.len());
        for series in channels {
            let mut input = series.to_vec();
            if params.remove_offset {
                input = detrend(&input, DetrendKind::Constant);
            }
            if let Some(tf) = &supply {
                input = lfilter(tf, &input)?;
            }
            let bandpassed = lfilter(&bandpass, &input)?;
            let peak_to_peak = windowed.reduce(&bandpassed);

            let mean = if input.is_empty() {
                0.0
            } else {
                input.iter().sum::<f64>() / input.len() as f64
            };
            let spikes = adaptive_threshold(
                &peak_to_peak,
                params.hmt_larger_mean * mean,
                prev_windows,
                params.hmt_larger,
            );
            let rate = fill_back(&spikes, params.window).iter().sum::<f64>() / params.window as f64;

            results.push(ChannelAnalysis {
                input,
                bandpassed,
                peak_to_peak,
                spikes,
                rate,
            });
            steps.advance(progress);
        }
        Ok(results)
    }

    /// Full run against a registry
    ///
    /// Uses the first (workspace, signal, channels) triple of `selection`,
    /// stores the four output signals in the output workspace (created on
    /// first use, overwritten in place afterwards) and exports the rates.
    pub fn run(
        &self,
        registry: &mut WorkspaceRegistry<Payload>,
        selection: &Selection,
        params: &SpikeParameters,
        progress: &mut dyn Progress,
    ) -> Result<SpikeReport> {
        let (workspace, signal, requested) =
            selection.first().ok_or(WorkbenchError::EmptySelection)?;
        let source = (workspace.to_string(), signal.to_string());

        let store = registry.store(&source.0)?;
        if !store.has_signal(&source.1) {
            return Err(WorkbenchError::UnknownSignal {
                workspace: source.0.clone(),
                signal: source.1.clone(),
            });
        }
        let fs = store.sampling_rate().ok_or_else(|| {
            WorkbenchError::invalid(format!("workspace '{}' has no sampling rate", source.0))
        })?;

        let single = Selection::new().with(&source.0, &source.1, requested);
        let (channels, analyses) = {
            let projected = registry.get_data(&single, Orientation::BySignal);
            let mut channels = Vec::new();
            let mut series: Vec<&Array1<f64>> = Vec::new();
            for entry in projected.iter().flat_map(|ws| ws.entries.iter()) {
                for (channel, payload) in &entry.entries {
                    match payload.as_series() {
                        Some(s) => {
                            channels.push(channel.clone());
                            series.push(s);
                        }
                        None => log::warn!("'{}' on {} is not a 1-D series, skipped", source.1, channel),
                    }
                }
            }
            if series.is_empty() {
                return Err(WorkbenchError::EmptySelection);
            }
            let slices: Vec<Vec<f64>> = series.iter().map(|s| s.to_vec()).collect();
            let views: Vec<&[f64]> = slices.iter().map(|s| s.as_slice()).collect();
            (channels, self.analyze(&views, fs, params, progress)?)
        };

        self.store_outputs(registry, &channels, &analyses, params.window)?;

        let rates: Vec<f64> = analyses.iter().map(|a| a.rate).collect();
        let export = export_rates(
            self.export_directory.as_deref(),
            &params.export_file_name(),
            &rates,
        );

        log::info!(
            "spike detection on '{}/{}': {} channels, {} spike windows",
            source.0,
            source.1,
            channels.len(),
            rates.iter().sum::<f64>()
        );

        Ok(SpikeReport {
            source,
            channels,
            rates,
            mask: (self.output_workspace.clone(), MASK_SIGNAL.to_string()),
            parameters: params.clone(),
            export,
        })
    }

    fn store_outputs(
        &self,
        registry: &mut WorkspaceRegistry<Payload>,
        channels: &[String],
        analyses: &[ChannelAnalysis],
        window: usize,
    ) -> Result<()> {
        let mut outputs: [(&str, Vec<Payload>); 4] = [
            (INPUT_SIGNAL, Vec::new()),
            (BPF_SIGNAL, Vec::new()),
            (PEAK_TO_PEAK_SIGNAL, Vec::new()),
            (MASK_SIGNAL, Vec::new()),
        ];
        for a in analyses {
            outputs[0].1.push(Payload::from(a.input.clone()));
            outputs[1].1.push(Payload::from(a.bandpassed.clone()));
            outputs[2].1.push(Payload::from(fill_back(&a.peak_to_peak, window)));
            outputs[3].1.push(Payload::from(fill_back(&a.spikes, window)));
        }

        let ws = self.output_workspace.as_str();
        if !registry.contains(ws) {
            registry.create_workspace(ws, WorkspaceKind::Algorithm)?;
            registry.add_channels(ws, channels)?;
            for (name, payloads) in outputs {
                registry.add_signal(ws, name, payloads, channels)?;
            }
        } else {
            let missing: Vec<String> = {
                let store = registry.store(ws)?;
                channels.iter().filter(|c| !store.has_channel(c)).cloned().collect()
            };
            if !missing.is_empty() {
                registry.add_channels(ws, &missing)?;
            }
            for (name, payloads) in outputs {
                registry.replace_signal(ws, name, payloads, channels)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::NoProgress;

    fn quiet_detector() -> SpikeDetector {
        SpikeDetector {
            export_directory: None,
            ..SpikeDetector::default()
        }
    }

    #[test]
    fn test_threshold_warm_up_is_zero() {
        let p2p = vec![100.0; 10];
        let mask = adaptive_threshold(&p2p, 0.0, 4, 0.5);
        assert_eq!(&mask[..4], &[0.0; 4]);
        assert!(mask[4..].iter().all(|&m| m == 1.0));
    }

    #[test]
    fn test_threshold_single_spike() {
        let mut p2p = vec![1.0; 20];
        p2p[8] = 50.0;
        let mask = adaptive_threshold(&p2p, 0.5, 3, 3.0);

        let marked: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m == 1.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(marked, vec![8]);
    }

    #[test]
    fn test_threshold_channel_level_gate() {
        let mut p2p = vec![1.0; 10];
        p2p[6] = 10.0;
        // Large against the baseline but not above the channel level
        let mask = adaptive_threshold(&p2p, 20.0, 3, 3.0);
        assert!(mask.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_no_baseline_marks_nothing() {
        let mask = adaptive_threshold(&[5.0, 50.0, 500.0], 0.0, 0, 1.0);
        assert_eq!(mask, vec![0.0; 3]);
    }

    #[test]
    fn test_analyze_shapes_and_rate() {
        let fs = 512.0;
        let series: Vec<f64> = (0..1030).map(|i| ((i % 7) as f64) - 3.0).collect();
        let params = SpikeParameters {
            prev_seconds: 0.5,
            ..SpikeParameters::default()
        };

        let result = quiet_detector()
            .analyze(&[&series], fs, &params, &mut NoProgress)
            .unwrap();
        let channel = &result[0];

        assert_eq!(channel.input.len(), 1030);
        assert_eq!(channel.bandpassed.len(), 1030);
        assert_eq!(channel.peak_to_peak.len(), 41);
        assert_eq!(channel.spikes.len(), 41);
        // 0.5 * 512 / 25 = 10.24 → 10 warm-up windows
        assert!(channel.spikes[..10].iter().all(|&m| m == 0.0));
        assert!((channel.rate - channel.spikes.iter().sum::<f64>()).abs() < 1e-12);
    }

    #[test]
    fn test_offset_removal_centres_input() {
        let series = vec![100.0; 600];
        let params = SpikeParameters {
            remove_supply: false,
            ..SpikeParameters::default()
        };
        let result = quiet_detector()
            .analyze(&[&series], 512.0, &params, &mut NoProgress)
            .unwrap();
        assert!(result[0].input.iter().all(|x| x.abs() < 1e-12));
    }
}
