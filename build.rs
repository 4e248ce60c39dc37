use chrono::Utc;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

// Writes BUILD_TIME, GIT_HASH and BUILD_TARGET into $OUT_DIR/version.rs
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dest = PathBuf::from(env::var("OUT_DIR")?).join("version.rs");

    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    let built = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    fs::write(
        &dest,
        format!(
            "pub const BUILD_TIME: &str = {:?};\npub const GIT_HASH: &str = {:?};\npub const BUILD_TARGET: &str = {:?};\n",
            built.to_string(),
            git_hash,
            target
        ),
    )?;

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    Ok(())
}
