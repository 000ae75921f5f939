use assert_cmd::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn questions_file(count: usize) -> NamedTempFile {
    let questions: Vec<String> = (1..=count)
        .map(|id| format!(r#"{{"id": {id}, "question": "Question number {id}?", "answer": "yes"}}"#))
        .collect();
    let mut tmp = NamedTempFile::new().expect("temp questions");
    write!(tmp, "[{}]", questions.join(",")).expect("write questions");
    tmp
}

fn quiz_card(store: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("quiz-card").expect("binary exists");
    cmd.arg("--store").arg(store.path());
    cmd
}

#[test]
fn cli_answers_questions_and_prints_final_score() {
    let questions = questions_file(3);
    let store = TempDir::new().expect("temp store");
    quiz_card(&store)
        .arg("--questions")
        .arg(questions.path())
        .args(["yes", "no", "yes"])
        .assert()
        .success()
        .stdout(contains("== Question 1/3 =="))
        .stdout(contains("Question number 1?"))
        .stdout(contains("[Yes] [No]"))
        .stdout(contains("Answered 1: yes (+25)"))
        .stdout(contains("Answered 2: no (+0)"))
        .stdout(contains("Total Points: 25"))
        .stdout(contains("== Finished! =="))
        .stdout(contains("Your Final Score: 50 out of 75"))
        .stdout(contains("[Restart] [Exit]"))
        .stdout(contains("Session: 3 answer(s), 50 of 75 points"))
        .stdout(contains("Completed at"));
    assert!(store.path().join("UserAnswers.json").exists());
}

#[test]
fn cli_resumes_stored_session_unless_fresh() {
    let questions = questions_file(2);
    let store = TempDir::new().expect("temp store");
    quiz_card(&store)
        .arg("--questions")
        .arg(questions.path())
        .arg("yes")
        .assert()
        .success();

    quiz_card(&store)
        .assert()
        .success()
        .stdout(contains("== Question 2/2 =="))
        .stdout(contains("Total Points: 25"));

    quiz_card(&store)
        .arg("--fresh")
        .assert()
        .success()
        .stdout(contains("== Question 1/2 =="))
        .stdout(contains("Total Points: 0"));
}

#[test]
fn cli_exit_keeps_session_and_restart_clears_it() {
    let questions = questions_file(1);
    let store = TempDir::new().expect("temp store");
    quiz_card(&store)
        .arg("--questions")
        .arg(questions.path())
        .args(["no", "no", "yes"])
        .assert()
        .success()
        .stdout(contains("Exit requested"))
        .stdout(contains("Restarted").not())
        .stdout(contains("Session: 1 answer(s), 0 of 25 points"));
    assert!(store.path().join("UserAnswers.json").exists());

    quiz_card(&store)
        .arg("yes")
        .assert()
        .success()
        .stdout(contains("Restarted"))
        .stdout(contains("Session: 0 answer(s), 0 of 25 points"));
    assert!(!store.path().join("UserAnswers.json").exists());
}

#[test]
fn cli_reports_pointer_misses() {
    let questions = questions_file(1);
    let store = TempDir::new().expect("temp store");
    quiz_card(&store)
        .arg("--questions")
        .arg(questions.path())
        .args(["--viewport", "800x600", "move:0,0", "click:1,1"])
        .assert()
        .success()
        .stdout(contains("Hover: none"))
        .stdout(contains("Click at (1, 1) missed"))
        .stdout(contains("Session: 0 answer(s), 0 of 25 points"));
}

#[test]
fn cli_fails_without_questions() {
    let store = TempDir::new().expect("temp store");
    quiz_card(&store)
        .arg("yes")
        .assert()
        .failure()
        .stderr(contains("at least one question"));
}

#[test]
fn cli_rejects_unknown_arguments() {
    let store = TempDir::new().expect("temp store");
    quiz_card(&store)
        .arg("--bogus")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"));
    quiz_card(&store)
        .arg("tap:1,2")
        .assert()
        .failure()
        .stderr(contains("invalid event"));
}
