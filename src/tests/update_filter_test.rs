#[cfg(test)]
mod tests {
    use nalgebra::DMatrix;

    use crate::step_clamp::StepClamp;
    use crate::update_filter::{FilterChain, UpdateFilter};
    use crate::update_logger::UpdateLogger;

    /// A short trajectory: three joints, six waypoints, endpoints pinned.
    fn trajectory() -> DMatrix<f64> {
        let mut parameters = DMatrix::zeros(3, 6);
        for c in 0..6 {
            let t = c as f64 / 5.0;
            parameters[(0, c)] = 0.3 * t;
            parameters[(1, c)] = -0.8 * t;
            parameters[(2, c)] = 0.5 * t;
        }
        parameters
    }

    #[test]
    fn test_pipeline_clamps_and_logs() {
        let directory = std::env::temp_dir().display().to_string();
        let filename = format!("pipeline_test_{}.log", std::process::id());
        let logger = UpdateLogger::new(&directory, &filename);
        let log_path = logger.path().to_path_buf();

        let mut chain = FilterChain::new();
        chain.add(Box::new(StepClamp::new(0.25).unwrap()));
        chain.add(Box::new(logger));

        let parameters = trajectory();
        let before = parameters.clone();

        let mut update = DMatrix::zeros(3, 6);
        update[(1, 2)] = 0.8;
        update[(0, 3)] = -0.4;
        update[(2, 4)] = 0.1;

        // Two iterations through the same chain, endpoints excluded
        let modified = chain.filter(1, 4, 0, &parameters, &mut update).unwrap();
        assert!(modified);
        update[(1, 2)] = 0.3;
        let modified = chain.filter(1, 4, 1, &parameters, &mut update).unwrap();
        assert!(modified);

        chain.done(true, 2, 0.042);

        // The trajectory itself is read-only for the whole pipeline
        assert_eq!(parameters, before);
        // Oversized elements inside the window were clamped
        assert_eq!(update[(1, 2)], 0.25);
        assert_eq!(update[(0, 3)], -0.25);
        assert_eq!(update[(2, 4)], 0.1);

        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("iteration 0"));
        assert!(contents.contains("iteration 1"));
        // The logger runs after the clamp, so it records clamped values
        assert!(contents.contains("0.250000"));
        assert!(!contents.contains("0.800000"));
        assert!(contents.contains("done success=true iterations=2 cost=0.042000"));

        let _ = std::fs::remove_file(&log_path);
    }

    #[test]
    fn test_empty_chain_changes_nothing() {
        let mut chain = FilterChain::new();
        assert!(chain.is_empty());

        let parameters = trajectory();
        let mut update = DMatrix::from_element(3, 6, 0.7);
        let touched = chain.filter(0, 6, 0, &parameters, &mut update).unwrap();

        assert!(!touched);
        assert_eq!(update, DMatrix::from_element(3, 6, 0.7));
    }

    #[test]
    fn test_clamp_respects_the_window_in_a_chain() {
        let mut chain = FilterChain::new();
        chain.add(Box::new(StepClamp::new(0.25).unwrap()));

        let parameters = trajectory();
        let mut update = DMatrix::from_element(3, 6, 0.9);
        chain.filter(1, 4, 0, &parameters, &mut update).unwrap();

        for r in 0..3 {
            assert_eq!(update[(r, 0)], 0.9, "first waypoint is pinned");
            assert_eq!(update[(r, 5)], 0.9, "last waypoint is pinned");
            for c in 1..5 {
                assert_eq!(update[(r, c)], 0.25);
            }
        }
    }
}
