use ecog_workbench::data::{Payload, Selection, WorkspaceKind, WorkspaceRegistry};
use ecog_workbench::processing::{
    process_selection, NoProgress, OnConflict, Operation, Reduction, WindowedOperator,
};

const ALL_REDUCTIONS: [Reduction; 7] = [
    Reduction::Average,
    Reduction::Energy,
    Reduction::Power,
    Reduction::PeakToPeak,
    Reduction::Variance,
    Reduction::Entropy,
    Reduction::Skewness,
];

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn two_channel_workspace() -> WorkspaceRegistry<Payload> {
    let mut registry = WorkspaceRegistry::new(Some(512.0));
    registry.create_workspace("W", WorkspaceKind::Normal).unwrap();
    registry.add_channels("W", &names(&["CH1", "CH2"])).unwrap();
    registry
        .add_signal(
            "W",
            "S",
            vec![
                Payload::from(vec![0.0, 0.0, 10.0, 10.0, 0.0, 0.0, 10.0, 10.0]),
                Payload::from(vec![0.0; 8]),
            ],
            &names(&["CH1", "CH2"]),
        )
        .unwrap();
    registry
}

#[test]
fn test_filled_length_and_uniform_windows() {
    let series: Vec<f64> = (0..103).map(|i| ((i * 37) % 11) as f64 - 4.5).collect();
    let window = 10;

    for reduction in ALL_REDUCTIONS {
        let op = WindowedOperator::new(reduction, window).unwrap();
        let filled = op.apply(&series);

        assert_eq!(filled.len(), 100, "{:?}", reduction);
        for chunk in filled.chunks(window) {
            assert!(chunk.iter().all(|&v| v == chunk[0]), "{:?}", reduction);
            assert!(chunk[0].is_finite(), "{:?}", reduction);
        }
    }
}

#[test]
fn test_series_shorter_than_window() {
    let op = WindowedOperator::new(Reduction::Average, 16).unwrap();
    assert!(op.apply(&[1.0, 2.0, 3.0]).is_empty());
}

#[test]
fn test_hand_computed_window() {
    let window = [1.0, 2.0, 3.0, 4.0];
    assert!((Reduction::Average.reduce(&window) - 2.5).abs() < 1e-12);
    assert!((Reduction::Variance.reduce(&window) - 1.25).abs() < 1e-12);
    assert!((Reduction::Energy.reduce(&window) - 30.0).abs() < 1e-12);
    assert!((Reduction::Power.reduce(&window) - 7.5).abs() < 1e-12);
    assert!((Reduction::PeakToPeak.reduce(&window) - 3.0).abs() < 1e-12);
    // Symmetric window
    assert!(Reduction::Skewness.reduce(&window).abs() < 1e-12);
}

#[test]
fn test_peak_to_peak_scenario() {
    let mut registry = two_channel_workspace();
    let selection = Selection::new().with("W", "S", &["CH1", "CH2"]);

    // Every 2-sample window of CH1 is flat, so its range is zero
    let op = Operation::Windowed(WindowedOperator::new(Reduction::PeakToPeak, 2).unwrap());
    process_selection(&mut registry, &selection, &op, "P2P-2", OnConflict::Reject, &mut NoProgress)
        .unwrap();

    let op = Operation::Windowed(WindowedOperator::new(Reduction::PeakToPeak, 4).unwrap());
    process_selection(&mut registry, &selection, &op, "P2P-4", OnConflict::Reject, &mut NoProgress)
        .unwrap();

    let store = registry.store("W").unwrap();
    assert_eq!(store.get("CH1", "P2P-2"), Some(&Payload::from(vec![0.0; 8])));
    assert_eq!(store.get("CH1", "P2P-4"), Some(&Payload::from(vec![10.0; 8])));
    assert_eq!(store.get("CH2", "P2P-4"), Some(&Payload::from(vec![0.0; 8])));
}

#[test]
fn test_progress_reported_per_channel() {
    let mut registry = two_channel_workspace();
    let selection = Selection::new().with("W", "S", &["CH1", "CH2"]);
    let op = Operation::Windowed(WindowedOperator::new(Reduction::Energy, 4).unwrap());

    let mut reports = Vec::new();
    process_selection(
        &mut registry,
        &selection,
        &op,
        "E",
        OnConflict::Replace,
        &mut |p: u8| reports.push(p),
    )
    .unwrap();
    assert_eq!(reports, vec![50, 100]);
}
