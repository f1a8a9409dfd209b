//! Reconciliation as an ordered list of steps.
//!
//! A reconciler plans the [`Step`]s needed to move a resource from its prior to its desired
//! state and then applies them in order. A step awaits the completion of its remote mutations
//! before the next step starts. Steps are idempotent (they put the desired value
//! instead of applying a delta), so a reconciliation that failed halfway converges when it is
//! retried.

use std::fmt::Display;

use async_trait::async_trait;

#[async_trait]
pub trait Step: Display + Send + Sync {
    type Context: Sync;
    type Error: Send;

    async fn apply(&self, context: &Self::Context) -> Result<(), Self::Error>;
}

/// Applies `steps` in order and stops at the first failure.
pub async fn run<S: Step>(steps: &[S], context: &S::Context) -> Result<(), S::Error> {
    for (index, step) in steps.iter().enumerate() {
        tracing::debug!(%step, step.index = index, steps = steps.len(), "applying step");
        step.apply(context).await?;
        tracing::debug!(%step, "applied step");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Record(&'static str, bool);

    impl Display for Record {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    #[async_trait]
    impl Step for Record {
        type Context = Mutex<Vec<&'static str>>;
        type Error = &'static str;

        async fn apply(&self, context: &Self::Context) -> Result<(), Self::Error> {
            if !self.1 {
                return Err(self.0);
            }
            context.lock().expect("lock is not poisoned").push(self.0);
            Ok(())
        }
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let applied = Mutex::new(Vec::new());
        let steps = [
            Record("first", true),
            Record("second", false),
            Record("third", true),
        ];

        assert_eq!(run(&steps, &applied).await, Err("second"));
        assert_eq!(*applied.lock().expect("lock is not poisoned"), vec!["first"]);
    }
}
