#![forbid(unsafe_code)]

use std::io::Read;
use std::time::Instant;

use agentmem_core::validator;

use crate::config;
use crate::logging::{Level, Logger};

/// `index build`: rebuilds `trailer-index.json` from `git log` and reports a summary. Exits 1
/// with `Error [tag]: ...` on failure, per §7's CLI-surfacing contract.
pub fn index_build() {
    let logger = Logger::new("cli.index-build", Level::Info);
    let started = Instant::now();
    match agentmem_store::build_index() {
        Ok(index) => {
            let commits = index.commit_count.to_string();
            logger.info_timed("build", started, &[("commits", commits.as_str()), ("head", index.head_commit.as_str())]);
            println!(
                "indexed {} commits (head {})",
                index.commit_count, index.head_commit
            );
        }
        Err(e) => fail(&e.tag().to_string(), &e.to_string()),
    }
}

/// `index validate`: runs the commit-message validator (C2) over a raw message read from
/// stdin, printing `✓` when clean or the diagnostics otherwise. Exits 1 if any diagnostic is
/// an error, 0 if only warnings (or none) are present, matching §7's validator contract.
pub fn index_validate() {
    let mut message = String::new();
    if std::io::stdin().read_to_string(&mut message).is_err() {
        fail("io-failed", "could not read commit message from stdin");
        return;
    }

    let diagnostics = validator::validate(&message);
    if diagnostics.is_empty() {
        eprintln!("\u{2713} commit message has no diagnostics");
        return;
    }

    let mut has_error = false;
    for diagnostic in &diagnostics {
        has_error |= diagnostic.severity == agentmem_core::Severity::Error;
        eprintln!("{} [{}]: {}", diagnostic.severity.as_str(), diagnostic.rule, diagnostic.message);
    }

    if has_error {
        std::process::exit(1);
    }
}

/// `config show`: prints the effective `RlmConfig` (file plus environment overrides) as
/// pretty-printed JSON.
pub fn config_show() {
    let config = config::load_config();
    match serde_json::to_string_pretty(&config) {
        Ok(text) => println!("{text}"),
        Err(e) => fail("json-error", &e.to_string()),
    }
}

fn fail(tag: &str, message: &str) {
    eprintln!("Error [{tag}]: {message}");
    std::process::exit(1);
}
