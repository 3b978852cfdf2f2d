use crate::slice::Slice;
use futures::future;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};

/// Stream of isolated copies of one slice kind.
///
/// Ends (yields `None`) once the store is disposed or dropped, right away for
/// a kind the store does not hold, and after the last value it could copy if
/// an isolation copy fails.
#[derive(Debug)]
pub struct SliceStream<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> SliceStream<T> {
    pub(crate) fn new(rx: UnboundedReceiver<T>) -> Self {
        Self { rx }
    }

    /// Take the next queued value without waiting.
    ///
    /// Returns `None` when nothing is queued or the stream has ended.
    pub fn try_recv(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl<T: Slice> SliceStream<T> {
    /// Project each slice and skip values equal to the previous projection.
    pub fn select<R, F>(self, f: F) -> impl Stream<Item = R>
    where
        F: FnMut(&T) -> R,
        R: PartialEq + Clone,
    {
        self.select_by(f, |prev, next| prev == next)
    }

    /// Like [`select`](Self::select) with a custom equality.
    pub fn select_by<R, F, E>(self, mut f: F, eq: E) -> impl Stream<Item = R>
    where
        F: FnMut(&T) -> R,
        E: FnMut(&R, &R) -> bool,
        R: Clone,
    {
        distinct(self.map(move |slice| f(&slice)), eq)
    }

    /// Project only slices matching `predicate`, skipping repeats.
    pub fn select_when<R, P, F>(self, predicate: P, mut f: F) -> impl Stream<Item = R>
    where
        P: FnMut(&T) -> bool,
        F: FnMut(&T) -> R,
        R: PartialEq + Clone,
    {
        distinct(self.matching(predicate).map(move |slice| f(&slice)), |prev, next| {
            prev == next
        })
    }

    /// Keep only slices matching `predicate`.
    pub fn matching<P>(self, mut predicate: P) -> impl Stream<Item = T>
    where
        P: FnMut(&T) -> bool,
    {
        self.filter(move |slice| future::ready(predicate(slice)))
    }
}

impl<T> Stream for SliceStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

/// Stream yielding `()` once per committed update of any slice.
#[derive(Debug)]
pub struct ChangeStream {
    rx: UnboundedReceiver<()>,
}

impl ChangeStream {
    pub(crate) fn new(rx: UnboundedReceiver<()>) -> Self {
        Self { rx }
    }

    /// Drain queued notifications, returning how many there were.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while self.rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }
}

impl Stream for ChangeStream {
    type Item = ();

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<()>> {
        self.rx.poll_recv(cx)
    }
}

fn distinct<S, E>(stream: S, mut eq: E) -> impl Stream<Item = S::Item>
where
    S: Stream,
    S::Item: Clone,
    E: FnMut(&S::Item, &S::Item) -> bool,
{
    let mut last: Option<S::Item> = None;
    stream.filter_map(move |value| {
        let changed = match &last {
            Some(prev) => !eq(prev, &value),
            None => true,
        };
        if changed {
            last = Some(value.clone());
        }
        future::ready(changed.then_some(value))
    })
}
