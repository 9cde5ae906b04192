//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create an envsec command isolated from the real environment.
    ///
    /// HOME and the cache dir point at the temp home, the working
    /// directory is the temp project, and every `ENVSEC_*` and AWS
    /// variable that could trigger network access is cleared.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("envsec").expect("failed to find envsec binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("XDG_CACHE_HOME", self.home.path().join(".cache"));
        cmd.env("NO_COLOR", "1");
        for var in [
            "ENVSEC_STORE",
            "ENVSEC_ID_TOKEN",
            "ENVSEC_ACCESS_TOKEN",
            "ENVSEC_ENV",
            "ENVSEC_LOG",
            "ENVSEC_API_HOST",
            "ENVSEC_AUTH_DOMAIN",
        ] {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Shortcut for `envsec set NAME=VALUE...`.
    pub fn set(&self, pairs: &[&str]) -> Output {
        self.cmd()
            .arg("set")
            .args(pairs)
            .output()
            .expect("failed to run envsec set")
    }

    /// Shortcut for `envsec rm NAME...`.
    pub fn rm(&self, names: &[&str]) -> Output {
        self.cmd()
            .arg("rm")
            .args(names)
            .output()
            .expect("failed to run envsec rm")
    }
}
