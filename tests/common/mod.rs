#![allow(dead_code)]

pub use indexcast_test_utils::{builders, fakes, init_tracing, with_timeout};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indexcast::exec::EnvironmentDescriptor;
use tempfile::TempDir;

/// A throwaway runtime environment.
///
/// The activation script is sourced, never executed: it defines a
/// `fakepython` shell function that only exists after activation, so a
/// successful run proves activation happened first and in the same shell.
pub struct FakeRuntime {
    pub dir: TempDir,
    pub activate: PathBuf,
}

impl FakeRuntime {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let activate = dir.path().join("activate");
        std::fs::write(
            &activate,
            "INDEXCAST_ACTIVE_ENV=ssd\n\
             export INDEXCAST_ACTIVE_ENV\n\
             fakepython() { /bin/sh \"$@\"; }\n",
        )
        .expect("write activation script");
        Self { dir, activate }
    }

    /// Descriptor running `fakepython` under plain `sh`.
    pub fn descriptor(&self, timeout: Duration) -> EnvironmentDescriptor {
        EnvironmentDescriptor::new(&self.activate, "ssd", timeout)
            .expect("valid descriptor")
            .with_shell("sh")
            .with_python("fakepython")
    }

    pub fn shared(&self, timeout: Duration) -> Arc<EnvironmentDescriptor> {
        Arc::new(self.descriptor(timeout))
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}
