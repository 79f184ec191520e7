//! Name → test resolution.
//!
//! Built-in tests are registered by name. Anything else that looks like a
//! path to an existing file resolves to a [`ScriptTest`]. No dynamic loading
//! happens: external tests are always separate processes.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::{hangs, range, HangTest, InterestingnessTest, RangeTest, ScriptTest, TestContext, TestError};

/// Builds a fresh test instance for one resolution.
pub type TestFactory = Arc<dyn Fn(&TestContext) -> Box<dyn InterestingnessTest> + Send + Sync>;

/// Registry of interestingness tests by name.
#[derive(Clone, Default)]
pub struct TestRegistry {
    factories: BTreeMap<String, TestFactory>,
}

impl TestRegistry {
    /// Registry with no tests; only script paths resolve.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in `hangs` and `range` tests.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(hangs::NAME, |ctx| Box::new(HangTest::from_context(ctx)));
        registry.register(range::NAME, |ctx| Box::new(RangeTest::new(ctx.clone())));
        registry
    }

    /// Register (or replace) a test under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&TestContext) -> Box<dyn InterestingnessTest> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve `name` to a fresh test instance.
    ///
    /// Registered names win over paths.
    pub fn resolve(
        &self,
        name: &str,
        ctx: &TestContext,
    ) -> Result<Box<dyn InterestingnessTest>, TestError> {
        if let Some(factory) = self.factories.get(name) {
            debug!(test = name, "resolved registered test");
            return Ok(factory(ctx));
        }

        if looks_like_path(name) && Path::new(name).is_file() {
            debug!(test = name, "resolved script test");
            return Ok(Box::new(ScriptTest::from_context(name, ctx)));
        }

        Err(TestError::UnknownTest(name.to_string()))
    }
}

fn looks_like_path(name: &str) -> bool {
    name.contains('/') || name.contains(std::path::MAIN_SEPARATOR)
}

impl std::fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestRegistry")
            .field("tests", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullSink;
    use crate::test_utils::{CallLog, FakeExecutor, RecordingTest};

    fn context(registry: TestRegistry) -> TestContext {
        TestContext::new(
            Arc::new(FakeExecutor::always_normal()),
            Arc::new(NullSink),
            Arc::new(registry),
        )
    }

    #[test]
    fn test_builtin_names() {
        let registry = TestRegistry::builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["hangs", "range"]);
        assert!(registry.contains("hangs"));
        assert!(!registry.contains("crashes"));
    }

    #[test]
    fn test_resolve_builtin() {
        let ctx = context(TestRegistry::builtin());
        assert_eq!(ctx.resolve("range").unwrap().name(), "range");
        assert_eq!(ctx.resolve("hangs").unwrap().name(), "hangs");
    }

    #[test]
    fn test_register_replaces_existing() {
        let log = CallLog::default();
        let mut registry = TestRegistry::builtin();
        registry.register("hangs", RecordingTest::factory(log.clone(), |_| true));
        let ctx = context(registry);

        let mut test = ctx.resolve("hangs").unwrap();
        assert!(test.interesting(&[], "").unwrap());
        assert_eq!(log.call_count(), 1);
    }

    #[test]
    fn test_resolve_script_path() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("check.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        let script = script.to_str().unwrap().to_string();

        let ctx = context(TestRegistry::empty());
        let test = ctx.resolve(&script).unwrap();
        assert_eq!(test.name(), script);
    }

    #[test]
    fn test_unknown_name_and_missing_path() {
        let ctx = context(TestRegistry::builtin());
        assert!(matches!(
            ctx.resolve("crashes"),
            Err(TestError::UnknownTest(name)) if name == "crashes"
        ));
        assert!(matches!(
            ctx.resolve("./definitely/not/here.sh"),
            Err(TestError::UnknownTest(_))
        ));
    }

    #[test]
    fn test_bare_name_is_not_treated_as_path() {
        // Tests run from the crate root, where Cargo.toml exists.
        assert!(Path::new("Cargo.toml").is_file());
        let ctx = context(TestRegistry::empty());
        assert!(ctx.resolve("Cargo.toml").is_err());
    }
}
