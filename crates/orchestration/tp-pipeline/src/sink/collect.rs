//! In-process sinks.

use async_trait::async_trait;
use tp_error::{Result, TpError};
use tp_traits::Sink;

/// Runs a fallible side effect for every element.
pub struct ForEach<F> {
    f: F,
}

impl<F> ForEach<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<T, F, E> Sink<T> for ForEach<F>
where
    T: Send + 'static,
    F: FnMut(T) -> std::result::Result<(), E> + Send,
    E: Into<anyhow::Error>,
{
    type Output = ();

    async fn consume(&mut self, item: T) -> Result<()> {
        (self.f)(item).map_err(TpError::sink)
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

/// Folds every element into an accumulator.
///
/// The accumulator is moved through the function, so the fold needs no
/// `Clone` bound on it.
pub struct Reduce<F, A> {
    f: F,
    acc: Option<A>,
}

impl<F, A> Reduce<F, A> {
    pub fn new(f: F, initial: A) -> Self {
        Self {
            f,
            acc: Some(initial),
        }
    }
}

#[async_trait]
impl<T, F, A, E> Sink<T> for Reduce<F, A>
where
    T: Send + 'static,
    A: Send,
    F: FnMut(A, T) -> std::result::Result<A, E> + Send,
    E: Into<anyhow::Error>,
{
    type Output = A;

    async fn consume(&mut self, item: T) -> Result<()> {
        let acc = self.acc.take().ok_or_else(accumulator_lost)?;
        self.acc = Some((self.f)(acc, item).map_err(TpError::sink)?);
        Ok(())
    }

    fn finish(self) -> Result<A> {
        self.acc.ok_or_else(accumulator_lost)
    }
}

// Only reachable if the sink is used again after a failed fold.
fn accumulator_lost() -> TpError {
    TpError::sink(anyhow::anyhow!("accumulator lost by an earlier failure"))
}

/// Collects every element, in order.
pub struct Collect<T> {
    items: Vec<T>,
}

impl<T> Collect<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Default for Collect<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> Sink<T> for Collect<T> {
    type Output = Vec<T>;

    async fn consume(&mut self, item: T) -> Result<()> {
        self.items.push(item);
        Ok(())
    }

    fn finish(self) -> Result<Vec<T>> {
        Ok(self.items)
    }
}
