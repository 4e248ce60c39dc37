//! Build metadata generated by the build script

include!(concat!(env!("OUT_DIR"), "/version.rs"));

/// Build time string from the build script (UTC)
pub fn build_time() -> &'static str {
    BUILD_TIME
}

/// Short git hash captured by the build script
pub fn git_hash() -> &'static str {
    GIT_HASH
}

/// Target triple the binary was built for
pub fn build_target() -> &'static str {
    BUILD_TARGET
}

/// Version line shown by `--version`
pub fn long_version() -> String {
    format!(
        "{} ({} built {} for {})",
        env!("CARGO_PKG_VERSION"),
        git_hash(),
        build_time(),
        build_target()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_version_carries_build_metadata() {
        let version = long_version();
        assert!(version.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(version.contains(git_hash()));
        assert!(version.contains(&format!("for {})", build_target())));
    }
}
