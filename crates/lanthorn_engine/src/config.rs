//! Engine configuration.

/// Limits and switches for one running world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Seed for the world's random number generator.
    pub seed: u64,
    /// Evaluator steps a task may take before it must suspend.
    pub step_budget: u64,
    /// Maximum nesting of function calls and handler dispatches.
    pub max_call_depth: usize,
    /// Log every dispatch step at `trace` level.
    pub trace_dispatch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            step_budget: 100_000,
            max_call_depth: 128,
            trace_dispatch: false,
        }
    }
}

impl EngineConfig {
    /// Small budgets and a fixed seed, so runaway scripts fail fast in tests.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            seed: 42,
            step_budget: 10_000,
            max_call_depth: 32,
            trace_dispatch: false,
        }
    }

    /// Defaults with dispatch tracing enabled.
    #[must_use]
    pub fn development() -> Self {
        Self {
            trace_dispatch: true,
            ..Self::default()
        }
    }

    /// Sets the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the per-run step budget.
    #[must_use]
    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = budget;
        self
    }

    /// Sets the maximum call depth.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Enables or disables dispatch tracing.
    #[must_use]
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let d = EngineConfig::default();
        assert_eq!(d.step_budget, 100_000);
        assert_eq!(d.max_call_depth, 128);
        assert!(!d.trace_dispatch);

        assert!(EngineConfig::testing().step_budget < d.step_budget);
        assert!(EngineConfig::development().trace_dispatch);
    }

    #[test]
    fn builders() {
        let c = EngineConfig::default()
            .with_seed(7)
            .with_step_budget(50)
            .with_max_call_depth(4)
            .with_trace_dispatch(true);
        assert_eq!(c.seed, 7);
        assert_eq!(c.step_budget, 50);
        assert_eq!(c.max_call_depth, 4);
        assert!(c.trace_dispatch);
    }
}
