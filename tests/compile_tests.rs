use std::path::PathBuf;

#[test]
fn compile_tests() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/fail/*.rs");
    t.pass("tests/pass/*.rs");
}

#[test]
fn every_fail_case_has_expected_stderr() {
    let fail_dir = PathBuf::from("tests/fail");
    for entry in std::fs::read_dir(fail_dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "rs") {
            let stderr_path = path.with_extension("stderr");
            assert!(stderr_path.exists(), "Missing .stderr file for {:?}", path);
        }
    }
}
