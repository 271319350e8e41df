use std::fmt::Debug;

///
/// One step of a lookup query. `depth` is 0 at the root and grows by one per
/// independent variable consumed.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceEvent<'a, T>
{
    /// Entering a node with the query value for its variable.
    Descend { depth: usize, variable: &'a str, value: T },
    /// Value outside the breakpoints (or exactly on one); `index` is used without blending.
    Clamp { depth: usize, variable: &'a str, index: usize, breakpoint: T },
    /// Value bracketed by `breakpoints[lower]` and `breakpoints[lower + 1]`.
    Bracket { depth: usize, variable: &'a str, lower: usize, low: T, high: T },
    /// Result of blending the two bracketing vectors.
    Blend { depth: usize, variable: &'a str, ratio: T, low: &'a [T], high: &'a [T], result: &'a [T] },
}

impl<T: Copy> TraceEvent<'_, T>
{
    pub fn depth(&self) -> usize
    {
        match *self
        {
            TraceEvent::Descend { depth, .. }
            | TraceEvent::Clamp { depth, .. }
            | TraceEvent::Bracket { depth, .. }
            | TraceEvent::Blend { depth, .. } => depth,
        }
    }

    pub fn to_owned_event(&self) -> OwnedTraceEvent<T>
    {
        match *self
        {
            TraceEvent::Descend { depth, variable, value } => OwnedTraceEvent::Descend { depth, variable: variable.to_string(), value },
            TraceEvent::Clamp { depth, variable, index, breakpoint } => OwnedTraceEvent::Clamp { depth, variable: variable.to_string(), index, breakpoint },
            TraceEvent::Bracket { depth, variable, lower, low, high } => OwnedTraceEvent::Bracket { depth, variable: variable.to_string(), lower, low, high },
            TraceEvent::Blend { depth, variable, ratio, low, high, result } => OwnedTraceEvent::Blend
            {
                depth,
                variable: variable.to_string(),
                ratio,
                low: low.to_vec(),
                high: high.to_vec(),
                result: result.to_vec(),
            },
        }
    }
}

/// Owned copy of a [`TraceEvent`], as kept by [`TraceRecorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum OwnedTraceEvent<T>
{
    Descend { depth: usize, variable: String, value: T },
    Clamp { depth: usize, variable: String, index: usize, breakpoint: T },
    Bracket { depth: usize, variable: String, lower: usize, low: T, high: T },
    Blend { depth: usize, variable: String, ratio: T, low: Vec<T>, high: Vec<T>, result: Vec<T> },
}

/// Receiver for the diagnostic events of a query.
pub trait TraceSink<T>
{
    fn record(&mut self, event: &TraceEvent<'_, T>);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoTrace;

impl<T> TraceSink<T> for NoTrace
{
    #[inline]
    fn record(&mut self, _event: &TraceEvent<'_, T>) {}
}

impl<T, F: FnMut(&TraceEvent<'_, T>)> TraceSink<T> for F
{
    fn record(&mut self, event: &TraceEvent<'_, T>)
    {
        self(event)
    }
}

/// Forwards events to `tracing` at TRACE level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl<T: Debug> TraceSink<T> for TracingSink
{
    fn record(&mut self, event: &TraceEvent<'_, T>)
    {
        match event
        {
            TraceEvent::Descend { depth, variable, value } =>
                tracing::trace!(depth, variable, ?value, "interpolating"),
            TraceEvent::Clamp { depth, variable, index, breakpoint } =>
                tracing::trace!(depth, variable, index, ?breakpoint, "clamped to breakpoint"),
            TraceEvent::Bracket { depth, variable, lower, low, high } =>
                tracing::trace!(depth, variable, lower, ?low, ?high, "bracketed"),
            TraceEvent::Blend { depth, variable, ratio, low, high, result } =>
                tracing::trace!(depth, variable, ?ratio, ?low, ?high, ?result, "blended"),
        }
    }
}

/// Collects owned copies of every event.
#[derive(Clone, Debug, Default)]
pub struct TraceRecorder<T>
{
    pub events: Vec<OwnedTraceEvent<T>>,
}

impl<T> TraceRecorder<T>
{
    pub fn new() -> Self
    {
        Self { events: Vec::new() }
    }
}

impl<T: Copy> TraceSink<T> for TraceRecorder<T>
{
    fn record(&mut self, event: &TraceEvent<'_, T>)
    {
        self.events.push(event.to_owned_event());
    }
}

#[test]
fn check_closure_sink()
{
    fn as_sink<F: FnMut(&TraceEvent<'_, f64>)>(f: F) -> F
    {
        f
    }
    let mut depths = Vec::new();
    {
        let mut sink = as_sink(|event| depths.push(event.depth()));
        sink.record(&TraceEvent::Descend { depth: 0, variable: "x", value: 1.0 });
        sink.record(&TraceEvent::Clamp { depth: 1, variable: "y", index: 0, breakpoint: 2.0 });
    }
    assert_eq!(depths, vec![0, 1]);
}

#[test]
fn check_recorder_owns_events()
{
    let mut recorder = TraceRecorder::new();
    let low = [1.0, 2.0];
    let high = [3.0, 4.0];
    let result = [2.0, 3.0];
    recorder.record(&TraceEvent::Blend { depth: 0, variable: "x", ratio: 0.5, low: &low, high: &high, result: &result });
    assert_eq!(recorder.events, vec![OwnedTraceEvent::Blend
    {
        depth: 0,
        variable: "x".into(),
        ratio: 0.5,
        low: vec![1.0, 2.0],
        high: vec![3.0, 4.0],
        result: vec![2.0, 3.0],
    }]);
}
