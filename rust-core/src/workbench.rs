//! Workbench session: data registry, display overlay and detector memory
//!
//! Every structural change made through the workbench is forwarded to the
//! overlay before the call returns. Edits made through `registry_mut` are
//! picked up on the next `sync_overlay`.

use std::sync::mpsc::Receiver;

use crate::config::WorkbenchConfig;
use crate::data::{Payload, Selection, StructureEvent, WorkspaceRegistry};
use crate::detection::{DetectionSession, SpikeDetector, SpikeParameters, SpikeReport};
use crate::error::Result;
use crate::ingest::{import_acquisition, Acquisition};
use crate::overlay::PresentationOverlay;
use crate::processing::{process_selection, OnConflict, Operation, Progress};

/// Workspace receiving freshly opened acquisitions
pub const SANDBOX_WORKSPACE: &str = "Sandbox";

pub struct Workbench {
    registry: WorkspaceRegistry<Payload>,
    overlay: PresentationOverlay,
    overlay_events: Receiver<StructureEvent>,
    detector: SpikeDetector,
    session: DetectionSession,
    config: WorkbenchConfig,
}

impl Workbench {
    pub fn new(config: WorkbenchConfig) -> Result<Self> {
        Self::build(config, PresentationOverlay::new())
    }

    /// Workbench with deterministic overlay colors
    pub fn with_overlay_seed(config: WorkbenchConfig, seed: u64) -> Result<Self> {
        Self::build(config, PresentationOverlay::with_seed(seed))
    }

    fn build(config: WorkbenchConfig, overlay: PresentationOverlay) -> Result<Self> {
        config.validate()?;
        let mut registry = WorkspaceRegistry::new(Some(config.sampling_rate));
        let overlay_events = registry.subscribe();
        Ok(Self {
            registry,
            overlay,
            overlay_events,
            detector: SpikeDetector::from_config(&config),
            session: DetectionSession::new(),
            config,
        })
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn registry(&self) -> &WorkspaceRegistry<Payload> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut WorkspaceRegistry<Payload> {
        &mut self.registry
    }

    pub fn overlay(&self) -> &PresentationOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut PresentationOverlay {
        &mut self.overlay
    }

    pub fn session(&self) -> &DetectionSession {
        &self.session
    }

    /// Apply pending structural events to the overlay
    ///
    /// # Returns
    /// Number of events applied
    pub fn sync_overlay(&mut self) -> usize {
        self.overlay.sync(&self.overlay_events)
    }

    /// Drop every workspace and load `acquisition` into the sandbox
    ///
    /// # Returns
    /// Name of the signal holding the raw recording
    pub fn open_acquisition(&mut self, acquisition: &Acquisition) -> Result<String> {
        // Validate before clearing so a bad acquisition keeps the old session
        acquisition.resolved_channel_names()?;

        self.registry.remove_all();
        let result = import_acquisition(&mut self.registry, SANDBOX_WORKSPACE, acquisition);
        self.sync_overlay();
        result
    }

    /// Run the spike detector on the first triple of `selection`
    ///
    /// Without explicit parameters the previous run's parameters are reused,
    /// falling back to the configured defaults.
    pub fn detect_spikes(
        &mut self,
        selection: &Selection,
        parameters: Option<SpikeParameters>,
        progress: &mut dyn Progress,
    ) -> Result<SpikeReport> {
        let parameters =
            parameters.unwrap_or_else(|| self.session.parameters_or(&self.config.detection));
        let result = self
            .detector
            .run(&mut self.registry, selection, &parameters, progress);
        self.sync_overlay();

        let report = result?;
        self.session
            .remember(&report.parameters, &report.source.0, &report.source.1);
        Ok(report)
    }

    /// Run `operation` and store its output next to the input signal
    pub fn process(
        &mut self,
        selection: &Selection,
        operation: &Operation,
        output_name: Option<&str>,
        on_conflict: OnConflict,
        progress: &mut dyn Progress,
    ) -> Result<(String, Vec<String>)> {
        let output_name = output_name
            .map(str::to_string)
            .unwrap_or_else(|| operation.name());
        let result = process_selection(
            &mut self.registry,
            selection,
            operation,
            &output_name,
            on_conflict,
            progress,
        );
        self.sync_overlay();
        result
    }
}
