//! Embeds a human-readable version string as `BUILD_INFO_HUMAN`.
//!
//! Format: `{pkg version} ({revision}) {rustc version}`, where the revision is
//! `git describe --tags --dirty` when a tag is reachable, otherwise
//! `g{short sha}[+dirty]`, otherwise the build date. Missing pieces are left
//! out.

use std::{env, process::Command};

use chrono::Utc;

fn main() {
    for path in ["src", "build.rs", "Cargo.toml", "Cargo.lock"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let info = [
        Some(version),
        Some(format!("({})", revision())),
        run("rustc", &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={info}");
}

fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn revision() -> String {
    if let Some(tagged) = run("git", &["describe", "--tags", "--dirty"]) {
        return tagged;
    }

    let Some(sha) = run("git", &["rev-parse", "--short=12", "HEAD"]) else {
        return format!("built {}", Utc::now().format("%Y-%m-%d"));
    };

    // `cargo install --git` drops a .cargo-ok marker into the checkout
    let dirty = run("git", &["status", "--porcelain"]).is_some_and(|status| {
        status
            .lines()
            .any(|line| line.get(3..).is_some_and(|path| path != ".cargo-ok"))
    });

    format!("g{sha}{}", if dirty { "+dirty" } else { "" })
}
