#![cfg(unix)]

// A single test on purpose: it writes executables and then runs them, which
// must not race with other tests forking.

use cloudless_train::{train, TrainParams, TrainerEnv};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

fn install_script(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, format!("#!/bin/sh\n{body}")).expect("write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod");
}

#[test]
fn fake_trainer_run_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let home = dir.path().join("caffe");
    let snapshot = dir.path().join("snapshots/iter_40.caffemodel");
    let env = TrainerEnv::new(&home);

    install_script(
        &env.caffe_binary(),
        &format!(
            "echo \"args: $*\"\n\
             echo 'I0101 solver.cpp:1] Iteration 0, loss = 0.69' >&2\n\
             mkdir -p '{snap_dir}'\n\
             echo weights > '{snap}'\n\
             echo 'I0101 solver.cpp:2] Snapshotting to binary proto file {snap}' >&2\n",
            snap_dir = snapshot.parent().expect("parent").display(),
            snap = snapshot.display(),
        ),
    );
    install_script(
        &env.parse_log_script(),
        "name=$(basename \"$1\")\n\
         printf 'NumIters,Seconds,LearningRate,accuracy,loss\\n0,1.0,0.001,0.5,0.69\\n40,2.0,0.001,0.8,0.3\\n' > \"$2/$name.train\"\n\
         printf 'NumIters,Seconds,LearningRate,accuracy,loss\\n40,2.1,0.001,0.75,0.35\\n' > \"$2/$name.test\"\n",
    );

    let solver = dir.path().join("solver.prototxt");
    fs::write(&solver, "base_lr: 0.001\nmax_iter: 40\n").expect("solver");
    let params = TrainParams {
        solver: solver.clone(),
        input_weight_file: dir.path().join("alexnet.caffemodel"),
        output_weight_file: dir.path().join("out/finetuned.caffemodel"),
        log_dir: dir.path().join("logs"),
        log_num: 5,
        note: Some("smoke".to_string()),
    };

    let outcome = train(&env, &params).expect("train");

    assert_eq!(outcome.caption.as_deref(), Some("(lr: 0.001; max_iter: 40; smoke)"));
    assert_eq!(outcome.log_file, dir.path().join("logs/output0005.log"));
    let log = fs::read_to_string(&outcome.log_file).expect("log");
    assert!(log.contains(&format!("--solver={}", solver.display())));
    assert!(log.contains("Snapshotting to binary proto file"));

    assert_eq!(outcome.training.iterations(), vec![0, 40]);
    assert_eq!(outcome.validation.iterations(), vec![40]);
    assert!(dir.path().join("logs/output0005.log.validate").exists());

    assert_eq!(outcome.trained_weights, snapshot);
    assert_eq!(
        fs::read_to_string(&params.output_weight_file).expect("weights"),
        "weights\n"
    );
}
