use approx::assert_relative_eq;
use cloudless_core::LogPaths;
use cloudless_train::{finalize_parsed_logs, parse_logs, parse_run_logs, TrainError};
use std::fs;

const RAW_TRAIN: &str = "NumIters,Seconds,LearningRate,accuracy,loss\n\
                         0,1.0,0.001,0.5,0.69\n\
                         20,2.0,0.001,0.6,0.5\n";
const RAW_TEST: &str = "NumIters,Seconds,LearningRate,accuracy,loss\n\
                        20,2.1,0.001,0.7,0.45\n";

#[test]
fn parse_log_outputs_are_renamed_and_tab_separated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = LogPaths::new(dir.path(), 2);
    fs::write(paths.train_log(), RAW_TRAIN).expect("write train");
    fs::write(paths.with_suffix(".log.test"), RAW_TEST).expect("write test");
    fs::write(paths.validate_log(), "stale").expect("write stale");

    finalize_parsed_logs(&paths).expect("finalize");

    assert!(!paths.with_suffix(".log.test").exists());
    let validate = fs::read_to_string(paths.validate_log()).expect("validate");
    assert_eq!(
        validate,
        "Iters\tSeconds\t\tLR\taccuracy\tloss\n20\t2.1\t0.001\t0.7\t0.45\n"
    );

    let (training, validation) = parse_run_logs(&paths).expect("parse");
    assert_eq!(training.iterations(), vec![0, 20]);
    assert_relative_eq!(training.losses()[1], 0.5);
    assert_eq!(validation.len(), 1);
    assert_relative_eq!(validation.accuracies()[0], 0.7);

    let (again, _) = parse_logs(paths.log_file()).expect("parse by log file");
    assert_eq!(again, training);
}

#[test]
fn missing_series_is_a_read_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = LogPaths::new(dir.path(), 1);
    let err = parse_run_logs(&paths).expect_err("nothing there");
    assert!(matches!(err, TrainError::ReadLog { .. }));

    let err = finalize_parsed_logs(&paths).expect_err("no .test file");
    assert!(matches!(err, TrainError::ReadLog { .. }));
}
