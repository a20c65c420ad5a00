//! External predictor process tests
//!
//! Runs a small shell script in place of `nnUNet_predict`. Kept to a single
//! test so no other thread forks while the script file is being written.

#![cfg(target_os = "linux")]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tseg_run::models::InferenceMode;
use tseg_run::services::NnUnetPredictor;
use tseg_run::workflow::{BatchRunner, BatchSettings, PatientOutcome};

/// `(pid, process group)` from a `/proc/<pid>/stat` line
fn pid_and_group(stat: &str) -> (u32, u32) {
    let pid = stat.split_whitespace().next().unwrap().parse().unwrap();
    // Fields after the parenthesised command name: state, ppid, pgrp
    let after_comm = &stat[stat.rfind(')').unwrap() + 1..];
    let pgrp = after_comm.split_whitespace().nth(2).unwrap().parse().unwrap();
    (pid, pgrp)
}

fn write_script(path: &Path, body: &str) {
    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[tokio::test]
async fn test_predictor_runs_outside_runner_process_group() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("patients");
    let patient = root.join("p1");
    std::fs::create_dir_all(&patient).unwrap();
    std::fs::write(patient.join("T1.nii.gz"), b"t1").unwrap();

    // Arguments are -i <in> -o <out> -t <model> -f <fold>
    let script = temp.path().join("fake_predict.sh");
    write_script(
        &script,
        "sleep 0.2\ncat /proc/$$/stat > \"$4/stat.txt\"\necho done > \"$4/p1.nii.gz\"",
    );

    let runner = BatchRunner::new(
        BatchSettings::new(&root, InferenceMode::Tissue),
        NnUnetPredictor::new(script.to_string_lossy()),
    );
    let summary = runner
        .run(&["p1".to_string()], &CancellationToken::new())
        .await;

    assert!(matches!(
        summary.patients[0].outcome,
        PatientOutcome::Completed { .. }
    ));
    assert!(patient.join("segmentation").join("p1.nii.gz").exists());

    let child_stat = std::fs::read_to_string(patient.join("segmentation").join("stat.txt")).unwrap();
    let (child_pid, child_group) = pid_and_group(&child_stat);
    let (_, runner_group) = pid_and_group(&std::fs::read_to_string("/proc/self/stat").unwrap());

    // A terminal Ctrl+C signals the runner's group; the predictor leads its own
    assert_eq!(child_group, child_pid);
    assert_ne!(child_group, runner_group);
}
