//! Typed, composable pipeline stages.
//!
//! A [`Step`] declares its input/output types; a [`Workflow`] chains steps so
//! that each step's output type is the next step's input type, checked at
//! compile time. Steps run strictly in order; the first error aborts the
//! chain and propagates to the caller unchanged. Steps never retry — retries
//! belong to the client layer (`locflow_client::with_retries`).

use async_trait::async_trait;
use tracing::debug;

use locflow_client::ApiClient;
use locflow_core::Result;

/// Shared, read-only context threaded through every step: the client handle
/// and the settings of the current operation. Passed explicitly — no ambient
/// globals.
pub struct StepContext<'a> {
    pub client: &'a ApiClient,
    pub settings: &'a crate::send::SyncSettings,
}

/// One pipeline stage. A step either transforms its input deterministically
/// or performs exactly one category of network round-trip, surfacing remote
/// errors by returning them (never swallowing).
#[async_trait]
pub trait Step: Send + Sync {
    type Input: Send + 'static;
    type Output: Send + 'static;

    fn name(&self) -> &'static str;

    async fn run(&self, input: Self::Input, ctx: &StepContext<'_>) -> Result<Self::Output>;
}

/// Two steps fused into one; the glue behind [`Workflow::then`].
pub struct Chain<A, B> {
    first: A,
    second: B,
}

#[async_trait]
impl<A, B> Step for Chain<A, B>
where
    A: Step,
    B: Step<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn name(&self) -> &'static str {
        self.second.name()
    }

    async fn run(&self, input: Self::Input, ctx: &StepContext<'_>) -> Result<Self::Output> {
        let mid = self.first.run(input, ctx).await?;
        debug!(step = self.second.name(), "running step");
        self.second.run(mid, ctx).await
    }
}

/// Sequential composition of steps. If any step fails, later steps do not
/// run and the error reaches the caller as-is. There is no rollback:
/// re-running a workflow from scratch converges because uploads are
/// idempotent under hashing-based identity.
pub struct Workflow<S> {
    head: S,
}

impl<S: Step> Workflow<S> {
    pub fn start(step: S) -> Workflow<S> {
        Workflow { head: step }
    }

    pub fn then<N>(self, next: N) -> Workflow<Chain<S, N>>
    where
        N: Step<Input = S::Output>,
    {
        Workflow {
            head: Chain {
                first: self.head,
                second: next,
            },
        }
    }

    pub async fn run(&self, input: S::Input, ctx: &StepContext<'_>) -> Result<S::Output> {
        debug!(step = self.head.name(), "running workflow");
        self.head.run(input, ctx).await
    }
}

/// A step built from a closure; handy for validation stages and tests.
pub struct FnStep<I, O, F> {
    name: &'static str,
    f: F,
    _marker: std::marker::PhantomData<fn(I) -> O>,
}

impl<I, O, F> FnStep<I, O, F>
where
    F: Fn(I) -> Result<O> + Send + Sync,
{
    pub fn new(name: &'static str, f: F) -> Self {
        FnStep {
            name,
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<I, O, F> Step for FnStep<I, O, F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Result<O> + Send + Sync,
{
    type Input = I;
    type Output = O;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, input: I, _ctx: &StepContext<'_>) -> Result<O> {
        (self.f)(input)
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> (ApiClient, crate::send::SyncSettings) {
    let client = ApiClient::new(locflow_client::ClientOptions::new(
        "http://localhost:9",
        "proj_test",
        "key",
    ))
    .expect("client");
    let settings = crate::send::SyncSettings {
        branch_id: "main".into(),
        source_locale: "en".into(),
        target_locales: vec!["de".into()],
        timeout: std::time::Duration::from_secs(60),
        force: false,
    };
    (client, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::eyre;

    #[tokio::test]
    async fn steps_run_in_order_and_thread_values() {
        let (client, settings) = test_context();
        let ctx = StepContext {
            client: &client,
            settings: &settings,
        };
        let wf = Workflow::start(FnStep::new("double", |n: u32| Ok(n * 2)))
            .then(FnStep::new("stringify", |n: u32| Ok(format!("n={n}"))));
        let out = wf.run(21, &ctx).await.unwrap();
        assert_eq!(out, "n=42");
    }

    #[tokio::test]
    async fn failing_step_short_circuits_and_error_is_verbatim() {
        use std::sync::atomic::{AtomicBool, Ordering};
        static RAN_C: AtomicBool = AtomicBool::new(false);

        let (client, settings) = test_context();
        let ctx = StepContext {
            client: &client,
            settings: &settings,
        };
        let wf = Workflow::start(FnStep::new("a", |n: u32| Ok(n + 1)))
            .then(FnStep::new("b", |_n: u32| -> Result<u32> {
                Err(eyre!("enqueue rejected: quota exceeded"))
            }))
            .then(FnStep::new("c", |n: u32| {
                RAN_C.store(true, Ordering::SeqCst);
                Ok(n)
            }));

        let err = wf.run(0, &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "enqueue rejected: quota exceeded");
        assert!(!RAN_C.load(Ordering::SeqCst), "step after failure must not run");
    }
}
