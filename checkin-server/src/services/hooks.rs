//! Post-commit hooks
//!
//! Side effects (mostly LINE notifications) that run only after the primary
//! write succeeded. A failing hook is logged and dropped; it never turns the
//! primary operation into an error.

use futures::future::BoxFuture;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

struct Hook {
    name: &'static str,
    future: BoxFuture<'static, Result<(), BoxError>>,
}

/// Ordered list of named best-effort hooks
#[derive(Default)]
pub struct AfterCommit {
    hooks: Vec<Hook>,
}

impl AfterCommit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.hooks.push(Hook {
            name,
            future: Box::pin(future),
        });
    }

    /// Run every hook in order, returning how many failed
    pub async fn run(self) -> usize {
        let mut failed = 0;
        for hook in self.hooks {
            if let Err(e) = hook.future.await {
                tracing::warn!(hook = hook.name, error = %e, "Post-commit hook failed");
                failed += 1;
            }
        }
        failed
    }
}
