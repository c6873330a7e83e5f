#![forbid(unsafe_code)]

mod cli;
mod config;
mod error;
mod hooks;
mod llm_client;
mod logging;
mod repl;

fn usage() -> &'static str {
    "agentmem — commit-history memory service for an AI coding agent\n\n\
USAGE:\n\
  agentmem index build\n\
  agentmem index validate        (reads a raw commit message from stdin)\n\
  agentmem config show\n\
  agentmem prompt-submit         (hook; reads a JSON envelope from stdin)\n\
  agentmem post-tool             (hook; reads a JSON envelope from stdin)\n\
  agentmem session-stop          (hook; reads a JSON envelope from stdin)\n"
}

/// Dispatches on `argv[1]` (and, for the `index` namespace, `argv[2]`). No external
/// argument-parsing crate — this surface is intentionally minimal (§4.12). Hook subcommands
/// never fail the process; operator subcommands may exit non-zero on misuse or failure.
fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("index") => match args.get(1).map(String::as_str) {
            Some("build") => cli::index_build(),
            Some("validate") => cli::index_validate(),
            _ => usage_error(),
        },
        Some("config") => match args.get(1).map(String::as_str) {
            Some("show") => cli::config_show(),
            _ => usage_error(),
        },
        Some("prompt-submit") => hooks::prompt_submit(),
        Some("post-tool") => hooks::post_tool(),
        Some("session-stop") => hooks::session_stop(),
        Some("-h") | Some("--help") => {
            print!("{}", usage());
        }
        _ => usage_error(),
    }
}

fn usage_error() -> ! {
    eprint!("{}", usage());
    std::process::exit(2);
}
