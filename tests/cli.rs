mod common;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use common::{month_sheet, num, sample_workbook, text, write_fixture};
use predicates::prelude::*;
use tempfile::tempdir;

fn tuition(workbook: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tuition").expect("binary built");
    cmd.env("RUST_LOG", "warn").arg("--workbook").arg(workbook);
    cmd
}

fn workbook_without_roster(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("sem_alunos.xlsx");
    write_fixture(
        &path,
        &[month_sheet(
            "JANEIRO",
            vec![vec![
                text("05/01/2026"),
                text("Mensalidade Ana"),
                num(200.0),
                text("PIX"),
            ]],
        )],
    );
    path
}

#[test]
fn mutation_refuses_to_overwrite_a_workbook_that_failed_to_load() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = workbook_without_roster(temp_dir.path());
    let before = fs::read(&path).expect("fixture read");

    tuition(&path)
        .args(["enroll", "Ana Costa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));

    assert_eq!(fs::read(&path).expect("workbook read"), before);
}

#[test]
fn export_over_a_workbook_that_failed_to_load_is_refused() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = workbook_without_roster(temp_dir.path());
    let before = fs::read(&path).expect("fixture read");

    tuition(&path)
        .arg("export")
        .arg("--output")
        .arg(&path)
        .assert()
        .failure();

    assert_eq!(fs::read(&path).expect("workbook read"), before);
}

#[test]
fn explicit_output_is_allowed_after_a_failed_load() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = workbook_without_roster(temp_dir.path());
    let before = fs::read(&path).expect("fixture read");
    let output = temp_dir.path().join("nova.xlsx");

    tuition(&path)
        .args(["enroll", "Ana Costa", "--output"])
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read(&path).expect("workbook read"), before);
    tuition(&output)
        .arg("students")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana Costa"));
}

#[test]
fn missing_workbook_is_created_on_first_save() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("nova_planilha.xlsx");

    tuition(&path)
        .args(["enroll", "Bruno Lima", "--monthly-fee", "220"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bruno Lima enrolled"));

    assert!(path.exists());
    tuition(&path)
        .args(["students", "--filter", "bruno"])
        .assert()
        .success()
        .stdout(predicate::str::contains("R$ 220,00"));
}

#[test]
fn payment_is_saved_back_to_the_input_workbook() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = sample_workbook(temp_dir.path());

    tuition(&path)
        .args(["status", "Ana Costa", "MARÇO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PENDENTE"));

    tuition(&path)
        .args(["pay", "Ana Costa", "MARÇO", "--amount", "250", "--date", "05/03/2026"])
        .assert()
        .success();

    tuition(&path)
        .args(["status", "Ana Costa", "MARÇO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PAGO (R$ 250,00)"));
}

#[test]
fn match_mode_flag_separates_students_sharing_a_first_name() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = sample_workbook(temp_dir.path());

    tuition(&path)
        .args(["--match-mode", "keyed", "pay", "Joao Souza", "MARÇO", "--amount", "180"])
        .assert()
        .success();

    tuition(&path)
        .args(["--match-mode", "keyed", "status", "Joao Pereira", "MARÇO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PENDENTE"));
    tuition(&path)
        .args(["status", "Joao Pereira", "MARÇO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PAGO"));
}
