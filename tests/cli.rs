use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn doclens_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("doclens");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::write(
        root.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming. \
         It contains information about cargo and crates. Cargo builds crates quickly.",
    )
    .unwrap();
    fs::write(
        root.join("beta.txt"),
        "Beta plain text file. It discusses deployment and infrastructure. \
         Kubernetes and Docker are mentioned here.",
    )
    .unwrap();

    let config_path = root.join("doclens.toml");
    fs::write(
        &config_path,
        "[chunking]\nwindow_size = 40\noverlap = 10\n\n[provider]\nkind = \"disabled\"\n",
    )
    .unwrap();

    (tmp, config_path)
}

fn run_doclens(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = doclens_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run doclens binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn file_arg(tmp: &TempDir, name: &str) -> String {
    tmp.path().join(name).to_str().unwrap().to_string()
}

#[test]
fn test_stats_command() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_doclens(&config, &["stats", &file_arg(&tmp, "alpha.md")]);
    assert!(ok, "stats failed: {}", stderr);
    assert!(stdout.contains("alpha.md"));
    assert!(stdout.contains("markdown"));
    assert!(stdout.contains("Words:"));
    assert!(stdout.contains("Readability:"));
}

#[test]
fn test_chunk_json_output() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) =
        run_doclens(&config, &["--json", "chunk", &file_arg(&tmp, "beta.txt")]);
    assert!(ok, "chunk failed: {}", stderr);

    let chunks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let chunks = chunks.as_array().unwrap();
    assert!(chunks.len() > 1);
    assert_eq!(chunks[0]["chunk_index"], 0);
    assert_eq!(chunks[0]["start"], 0);
    assert_eq!(chunks[0]["end"], 40);
    assert_eq!(chunks[1]["start"], 30);
}

#[test]
fn test_chunk_overrides_window() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_doclens(
        &config,
        &[
            "--json",
            "chunk",
            &file_arg(&tmp, "beta.txt"),
            "--window",
            "1000",
            "--overlap",
            "0",
        ],
    );
    assert!(ok, "chunk failed: {}", stderr);
    let chunks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(chunks.as_array().unwrap().len(), 1);
}

#[test]
fn test_chunk_rejects_overlap_not_smaller_than_window() {
    let (tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_doclens(
        &config,
        &[
            "chunk",
            &file_arg(&tmp, "beta.txt"),
            "--window",
            "10",
            "--overlap",
            "10",
        ],
    );
    assert!(!ok);
    assert!(stderr.contains("overlap"));
}

#[test]
fn test_insights_degrade_without_provider() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) =
        run_doclens(&config, &["--json", "insights", &file_arg(&tmp, "alpha.md")]);
    assert!(ok, "insights failed: {}", stderr);

    let insights: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(insights["degraded"], true);
    assert_eq!(insights["bundle"]["sentiment"], "neutral");
    assert!(insights["stats"]["word_count"].as_u64().unwrap() > 0);
}

#[test]
fn test_ask_falls_back_to_sentences() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_doclens(
        &config,
        &["ask", &file_arg(&tmp, "alpha.md"), "cargo crates"],
    );
    assert!(ok, "ask failed: {}", stderr);
    assert!(stdout.contains("Cargo builds crates quickly"));
    assert!(stdout.contains("Sources: chunks"));
}

#[test]
fn test_similar_command() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) =
        run_doclens(&config, &["similar", &file_arg(&tmp, "beta.txt"), "docker"]);
    assert!(ok, "similar failed: {}", stderr);
    assert!(stdout.contains("SCORE"));

    let (stdout, _, ok) =
        run_doclens(&config, &["similar", &file_arg(&tmp, "beta.txt"), "haskell"]);
    assert!(ok);
    assert!(stdout.contains("No matching chunks."));
}

#[test]
fn test_compare_command() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_doclens(
        &config,
        &[
            "compare",
            &file_arg(&tmp, "alpha.md"),
            &file_arg(&tmp, "beta.txt"),
        ],
    );
    assert!(ok, "compare failed: {}", stderr);
    assert!(stdout.contains("alpha.md"));
    assert!(stdout.contains("beta.txt"));
}

#[test]
fn test_unsupported_file_type() {
    let (tmp, config) = setup_test_env();
    let image = tmp.path().join("photo.png");
    fs::write(&image, b"\x89PNG").unwrap();
    let (_, stderr, ok) = run_doclens(&config, &["stats", image.to_str().unwrap()]);
    assert!(!ok);
    assert!(stderr.contains("no processor supports"));
}

#[test]
fn test_missing_config_file_is_error() {
    let (tmp, _) = setup_test_env();
    let missing = tmp.path().join("nope.toml");
    let (_, stderr, ok) = run_doclens(&missing, &["stats", &file_arg(&tmp, "alpha.md")]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_provider_config_requires_model() {
    let (tmp, _) = setup_test_env();
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "[provider]\nkind = \"ollama\"\n").unwrap();
    let (_, stderr, ok) = run_doclens(&config, &["stats", &file_arg(&tmp, "alpha.md")]);
    assert!(!ok);
    assert!(stderr.contains("provider.model"));
}
