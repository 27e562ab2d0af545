//! ferry utility - main entrypoint
// (c) 2026 Ferry contributors

fn main() -> std::process::ExitCode {
    ferry::cli(std::env::args_os())
}
