//! Memory of the last detector invocation

use super::params::SpikeParameters;

/// Parameters and input of the previous run, offered again on the next one
#[derive(Debug, Clone, Default)]
pub struct DetectionSession {
    last_parameters: Option<SpikeParameters>,
    last_input: Option<(String, String)>,
}

impl DetectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last parameters, or `fallback` before the first run
    pub fn parameters_or(&self, fallback: &SpikeParameters) -> SpikeParameters {
        self.last_parameters.clone().unwrap_or_else(|| fallback.clone())
    }

    pub fn last_parameters(&self) -> Option<&SpikeParameters> {
        self.last_parameters.as_ref()
    }

    /// Workspace and signal of the previous run
    pub fn last_input(&self) -> Option<(&str, &str)> {
        self.last_input
            .as_ref()
            .map(|(ws, signal)| (ws.as_str(), signal.as_str()))
    }

    pub fn remember(&mut self, parameters: &SpikeParameters, workspace: &str, signal: &str) {
        self.last_parameters = Some(parameters.clone());
        self.last_input = Some((workspace.to_string(), signal.to_string()));
    }

    pub fn clear(&mut self) {
        self.last_parameters = None;
        self.last_input = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_and_recall() {
        let mut session = DetectionSession::new();
        let defaults = SpikeParameters::default();
        assert_eq!(session.parameters_or(&defaults), defaults);
        assert!(session.last_input().is_none());

        let custom = SpikeParameters {
            window: 40,
            ..SpikeParameters::default()
        };
        session.remember(&custom, "Sandbox", "Original Signal (rec)");

        assert_eq!(session.parameters_or(&defaults).window, 40);
        assert_eq!(session.last_input(), Some(("Sandbox", "Original Signal (rec)")));

        session.clear();
        assert!(session.last_parameters().is_none());
    }
}
