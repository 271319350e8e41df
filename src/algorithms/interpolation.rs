use num_traits::Float;

use crate::{errors::LTError, storage::lookup_tree::{LookupNode, NodeData}};

use super::trace::{TraceEvent, TraceSink};

/// Where a query value falls relative to a node's breakpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bracket
{
    /// Use the value stored at this index as is: the query lies at or below the first
    /// breakpoint, above the last one, or exactly on a breakpoint.
    Clamp(usize),
    /// Blend the values at `lower` and `lower + 1`.
    Between(usize),
}

///
/// Locate `value` among ascending `breakpoints`. The lower bracket is the greatest
/// index whose breakpoint is strictly less than `value`. Nothing is extrapolated: values
/// outside the range clamp flat to the nearest end.
///
pub fn locate<T: Float>(breakpoints: &[T], value: T) -> Bracket
{
    let below = breakpoints.partition_point(|x| *x < value);
    if below == 0
    {
        Bracket::Clamp(0)
    }
    else if below == breakpoints.len()
    {
        Bracket::Clamp(below - 1)
    }
    else if breakpoints[below] == value
    {
        Bracket::Clamp(below)
    }
    else
    {
        Bracket::Between(below - 1)
    }
}

///
/// Multilinear interpolation of the sub-tree rooted at `node`. `values` holds one entry
/// per level, the first consumed by `node` itself.
///
pub fn interpolate<T: Float, S: TraceSink<T>>(node: &LookupNode<T>, values: &[T], sink: &mut S) -> Result<Vec<T>, LTError>
{
    let expected = node.depth();
    if values.len() != expected
    {
        return Err(LTError::DimensionMismatch { expected, actual: values.len() });
    }
    Ok(interpolate_unchecked(node, values, 0, sink))
}

fn interpolate_unchecked<T: Float, S: TraceSink<T>>(node: &LookupNode<T>, values: &[T], depth: usize, sink: &mut S) -> Vec<T>
{
    let value = values[0];
    let variable = node.variable();
    let breakpoints = node.breakpoints();
    sink.record(&TraceEvent::Descend { depth, variable, value });
    match locate(breakpoints, value)
    {
        Bracket::Clamp(index) =>
        {
            sink.record(&TraceEvent::Clamp { depth, variable, index, breakpoint: breakpoints[index] });
            value_at(node, index, &values[1..], depth, sink)
        }
        Bracket::Between(lower) =>
        {
            let (x0, x1) = (breakpoints[lower], breakpoints[lower + 1]);
            sink.record(&TraceEvent::Bracket { depth, variable, lower, low: x0, high: x1 });
            let low = value_at(node, lower, &values[1..], depth, sink);
            let high = value_at(node, lower + 1, &values[1..], depth, sink);
            let ratio = (value - x0) / (x1 - x0);
            let result: Vec<T> = low.iter().zip(&high).map(|(&y0, &y1)| y0 + ratio * (y1 - y0)).collect();
            sink.record(&TraceEvent::Blend { depth, variable, ratio, low: &low, high: &high, result: &result });
            result
        }
    }
}

#[inline]
fn value_at<T: Float, S: TraceSink<T>>(node: &LookupNode<T>, index: usize, rest: &[T], depth: usize, sink: &mut S) -> Vec<T>
{
    match node.data()
    {
        NodeData::Children(children) => interpolate_unchecked(&children[index], rest, depth + 1, sink),
        NodeData::Leaf(rows) => rows[index].clone(),
    }
}

#[cfg(test)]
fn mach_table() -> LookupNode<f64>
{
    let rows = vec![vec![0.5, 0.02], vec![1.0, 0.04], vec![1.5, 0.03]];
    LookupNode::build(&rows, &["Mach".to_string()], &["CD".to_string()]).unwrap()
}

#[test]
fn check_locate()
{
    let x = [0.0, 1.0, 2.0];
    assert_eq!(locate(&x, -1.0), Bracket::Clamp(0));
    assert_eq!(locate(&x, 0.0), Bracket::Clamp(0));
    assert_eq!(locate(&x, 0.5), Bracket::Between(0));
    assert_eq!(locate(&x, 1.0), Bracket::Clamp(1));
    assert_eq!(locate(&x, 1.5), Bracket::Between(1));
    assert_eq!(locate(&x, 2.0), Bracket::Clamp(2));
    assert_eq!(locate(&x, 3.0), Bracket::Clamp(2));
    assert_eq!(locate(&[4.0], 3.0), Bracket::Clamp(0));
    assert_eq!(locate(&[4.0], 5.0), Bracket::Clamp(0));
}

#[test]
fn check_interpolate_1d()
{
    use super::trace::NoTrace;
    let table = mach_table();
    let cd = interpolate(&table, &[0.75], &mut NoTrace).unwrap()[0];
    assert!((cd - 0.03).abs() < 1e-12);
    // final gap blends like any other
    let cd = interpolate(&table, &[1.25], &mut NoTrace).unwrap()[0];
    assert!((cd - 0.035).abs() < 1e-12);
    assert_eq!(interpolate(&table, &[0.2], &mut NoTrace).unwrap(), vec![0.02]);
    assert_eq!(interpolate(&table, &[2.0], &mut NoTrace).unwrap(), vec![0.03]);
    assert_eq!(interpolate(&table, &[1.5], &mut NoTrace).unwrap(), vec![0.03]);
    assert_eq!(interpolate(&table, &[1.0], &mut NoTrace).unwrap(), vec![0.04]);
}

#[test]
fn check_interpolate_2d()
{
    use super::trace::NoTrace;
    let rows = vec![
        vec![0.5, 0.0, 0.1],
        vec![0.5, 5.0, 0.3],
        vec![1.0, 0.0, 0.2],
        vec![1.0, 5.0, 0.5],
    ];
    let table = LookupNode::build(&rows, &["Mach".to_string(), "Alpha".to_string()], &["CL".to_string()]).unwrap();
    let cl = interpolate(&table, &[0.75, 2.5], &mut NoTrace).unwrap()[0];
    assert!((cl - 0.275).abs() < 1e-12);
    assert_eq!(interpolate(&table, &[1.0, 5.0], &mut NoTrace).unwrap(), vec![0.5]);
    assert_eq!(interpolate(&table, &[0.5, 0.0], &mut NoTrace).unwrap(), vec![0.1]);
    // clamped in Mach, blended in Alpha
    let cl = interpolate(&table, &[3.0, 2.5], &mut NoTrace).unwrap()[0];
    assert!((cl - 0.35).abs() < 1e-12);
}

#[test]
fn check_dimension_mismatch()
{
    use super::trace::NoTrace;
    let table = mach_table();
    assert!(matches!(interpolate(&table, &[], &mut NoTrace), Err(LTError::DimensionMismatch { expected: 1, actual: 0 })));
    assert!(matches!(interpolate(&table, &[1.0, 2.0], &mut NoTrace), Err(LTError::DimensionMismatch { expected: 1, actual: 2 })));
}

#[test]
fn check_trace_events()
{
    use super::trace::{OwnedTraceEvent, TraceRecorder};
    let table = mach_table();
    let mut recorder = TraceRecorder::new();
    interpolate(&table, &[0.75], &mut recorder).unwrap();
    assert_eq!(recorder.events.len(), 3);
    assert_eq!(recorder.events[1], OwnedTraceEvent::Bracket { depth: 0, variable: "Mach".into(), lower: 0, low: 0.5, high: 1.0 });
    match &recorder.events[2]
    {
        OwnedTraceEvent::Blend { ratio, low, high, .. } =>
        {
            assert_eq!(*ratio, 0.5);
            assert_eq!(low, &vec![0.02]);
            assert_eq!(high, &vec![0.04]);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let mut recorder = TraceRecorder::new();
    interpolate(&table, &[9.0], &mut recorder).unwrap();
    assert_eq!(recorder.events[1], OwnedTraceEvent::Clamp { depth: 0, variable: "Mach".into(), index: 2, breakpoint: 1.5 });
}
