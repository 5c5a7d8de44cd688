use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn shopbot_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shopbot");
    path
}

const CATALOG: &str = r#"[
  {
    "id": "bm-1",
    "name": "Blue Mug",
    "tags": ["blue", "mug", "ceramic"],
    "description": "Hand-glazed stoneware mug",
    "priceINR": 299,
    "stock": 3,
    "sku": "BM-1"
  },
  {
    "id": "rm-1",
    "name": "Red Mug",
    "tags": ["red", "mug"],
    "priceINR": 1500,
    "quantity": 0
  },
  {
    "id": "tv-1",
    "name": "Terracotta Vase",
    "nameLowercase": "terracotta vase",
    "tags": ["terracotta", "vase"],
    "priceINR": 150000,
    "stock": 2,
    "sku": "TV-1"
  }
]"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(root.join("catalog.json"), CATALOG).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/shopbot.sqlite"

[assistant]
top_k = 6
history_limit = 50
search_timeout_ms = 5000

[server]
bind = "127.0.0.1:7340"
"#,
        root.display()
    );

    let config_path = config_dir.join("shopbot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_shopbot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shopbot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shopbot binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn seeded_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let (_, stderr, ok) = run_shopbot(&config_path, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    let catalog = tmp.path().join("catalog.json");
    let (stdout, stderr, ok) = run_shopbot(&config_path, &["import", catalog.to_str().unwrap()]);
    assert!(ok, "import failed: stdout={}, stderr={}", stdout, stderr);
    (tmp, config_path)
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shopbot(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success) = run_shopbot(&config_path, &["init"]);
    assert!(success, "Second init failed (not idempotent)");
}

#[test]
fn test_import_reports_counts() {
    let (tmp, config_path) = setup_test_env();
    run_shopbot(&config_path, &["init"]);
    let catalog = tmp.path().join("catalog.json");

    let (stdout, _, success) = run_shopbot(&config_path, &["import", catalog.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("upserted products: 3"));
    assert!(stdout.contains("products in catalog: 3"));

    // Re-import replaces rather than duplicates
    let (stdout, _, _) = run_shopbot(&config_path, &["import", catalog.to_str().unwrap()]);
    assert!(stdout.contains("products in catalog: 3"));
}

#[test]
fn test_import_rejects_non_array() {
    let (tmp, config_path) = setup_test_env();
    run_shopbot(&config_path, &["init"]);
    let bad = tmp.path().join("bad.json");
    fs::write(&bad, r#"{"name": "Blue Mug"}"#).unwrap();

    let (_, stderr, success) = run_shopbot(&config_path, &["import", bad.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("JSON array"));
}

#[test]
fn test_ask_greeting() {
    let (_tmp, config_path) = seeded_env();
    let (stdout, _, success) = run_shopbot(&config_path, &["ask", "hello"]);
    assert!(success);
    assert!(stdout.starts_with("Hi! I can help you"));
}

#[test]
fn test_ask_price() {
    let (_tmp, config_path) = seeded_env();
    let (stdout, _, success) = run_shopbot(&config_path, &["ask", "price of blue mug"]);
    assert!(success);
    assert_eq!(stdout.trim(), "Blue Mug costs ₹299.00. SKU: BM-1.");

    let (stdout, _, _) = run_shopbot(&config_path, &["ask", "how much is the terracotta vase?"]);
    assert_eq!(stdout.trim(), "Terracotta Vase costs ₹1,50,000.00. SKU: TV-1.");
}

#[test]
fn test_ask_availability_via_tag_fallback() {
    let (_tmp, config_path) = seeded_env();
    // No name starts with "mug"; the tag stage finds both mugs and the
    // in-stock one wins the tie.
    let (stdout, _, _) = run_shopbot(&config_path, &["ask", "is any mug available?"]);
    assert_eq!(
        stdout.trim(),
        "Blue Mug is in stock (3 available) and costs ₹299.00."
    );
}

#[test]
fn test_ask_not_found_and_unknown() {
    let (_tmp, config_path) = seeded_env();
    let (stdout, _, _) = run_shopbot(&config_path, &["ask", "do you have a brass lamp"]);
    assert!(stdout.contains("couldn't find that item"));

    let (stdout, _, success) = run_shopbot(&config_path, &["ask", "xyzzy quantum flux"]);
    assert!(success);
    assert_eq!(
        stdout.trim(),
        "I was not trained to answer this type of questions."
    );
}

#[test]
fn test_ask_search_lists_products() {
    let (_tmp, config_path) = seeded_env();
    let (stdout, _, _) = run_shopbot(&config_path, &["ask", "show me mug"]);
    assert!(stdout.contains("Here are some products I found:"));
    assert!(stdout.contains("• Blue Mug — ₹299.00 — 3 in stock"));
    assert!(stdout.contains("• Red Mug — ₹1,500.00 — out of stock"));
}

#[test]
fn test_history_persists_across_runs() {
    let (_tmp, config_path) = seeded_env();
    run_shopbot(&config_path, &["ask", "hello", "--session", "s1"]);
    run_shopbot(&config_path, &["ask", "price of red mug", "--session", "s1"]);

    let (stdout, _, success) = run_shopbot(&config_path, &["history", "--session", "s1"]);
    assert!(success);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5, "unexpected history: {}", stdout);
    assert!(lines[0].starts_with("bot: Hello! I'm the store assistant"));
    assert_eq!(lines[3], "you: price of red mug");
    assert_eq!(lines[4], "bot: Red Mug costs ₹1,500.00. SKU: N/A.");

    let (stdout, _, _) = run_shopbot(&config_path, &["history", "--session", "other"]);
    assert!(stdout.contains("No history"));
}

#[test]
fn test_chat_reads_stdin() {
    let (_tmp, config_path) = seeded_env();
    let mut child = Command::new(shopbot_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(["chat", "--session", "repl"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"hi\nprice of blue mug\n/quit\nhello again\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let bot_lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with("bot: ")).collect();
    assert_eq!(bot_lines.len(), 3, "unexpected output: {}", stdout);
    assert_eq!(bot_lines[2], "bot: Blue Mug costs ₹299.00. SKU: BM-1.");
}

#[test]
fn test_classify_needs_no_config() {
    let missing = Path::new("/nonexistent/shopbot.toml");
    let (stdout, _, success) = run_shopbot(
        missing,
        &["classify", "Show me the Terracotta Vase, medium size!"],
    );
    assert!(success);
    assert!(stdout.contains("intent: search"));
    assert!(stdout.contains("keywords: [terracotta, vase, medium, size]"));
}

#[test]
fn test_search_shows_scores() {
    let (_tmp, config_path) = seeded_env();
    let (stdout, _, success) = run_shopbot(&config_path, &["search", "blue mug"]);
    assert!(success);
    assert!(stdout.contains("keywords: [blue, mug]"));
    assert!(stdout.contains("[2.10] Blue Mug"));
    assert!(stdout.contains("(best)"));

    let (stdout, _, _) = run_shopbot(&config_path, &["search", "brass lamp"]);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_limit_is_validated() {
    let (_tmp, config_path) = seeded_env();
    let (stdout, _, success) = run_shopbot(&config_path, &["search", "mug", "--limit", "1"]);
    assert!(success);
    assert!(stdout.contains("1. ["));
    assert!(!stdout.contains("2. ["));

    for bad in ["0", "51"] {
        let (_, stderr, success) = run_shopbot(&config_path, &["search", "mug", "--limit", bad]);
        assert!(!success);
        assert!(stderr.contains("--limit must be in [1, 50]"), "stderr: {}", stderr);
    }
}

#[test]
fn test_missing_config_fails() {
    let missing = Path::new("/nonexistent/shopbot.toml");
    let (_, stderr, success) = run_shopbot(missing, &["ask", "hello"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
