use lutrust::{LookupNode, LookupTable, NodeData};
use proptest::prelude::*;

fn names(prefix: &str, n: usize) -> Vec<String>
{
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

/// Rows for a full cross product of the given breakpoints, dependent values from `f`.
fn grid_rows(axes: &[Vec<f64>], f: &dyn Fn(&[f64]) -> Vec<f64>) -> Vec<Vec<f64>>
{
    let mut rows: Vec<Vec<f64>> = vec![Vec::new()];
    for axis in axes
    {
        rows = rows.into_iter()
            .flat_map(move |prefix| axis.iter().map(move |&x| { let mut row = prefix.clone(); row.push(x); row }))
            .collect();
    }
    rows.into_iter().map(|mut row| { let y = f(&row); row.extend(y); row }).collect()
}

fn assert_ascending(node: &LookupNode<f64>)
{
    assert!(!node.is_empty());
    assert!(node.breakpoints().windows(2).all(|pair| pair[0] < pair[1]));
    if let NodeData::Children(children) = node.data()
    {
        assert_eq!(children.len(), node.len());
        children.iter().for_each(assert_ascending);
    }
}

fn axis() -> impl Strategy<Value = Vec<f64>>
{
    prop::collection::btree_set(-1000i32..1000, 1..6).prop_map(|set| set.into_iter().map(|v| v as f64 * 0.25).collect())
}

proptest!
{
    #[test]
    fn breakpoints_strictly_ascending(mut rows in prop::collection::vec(prop::collection::vec(-5i32..5, 3), 1..60))
    {
        // duplicated keys and arbitrary order
        rows.reverse();
        let rows: Vec<Vec<f64>> = rows.into_iter().map(|row| row.into_iter().map(f64::from).collect()).collect();
        let table = LookupTable::from_data(rows, 2, names("x", 2), names("y", 1)).unwrap();
        assert_ascending(table.root());
        prop_assert_eq!(table.root().depth(), 2);
    }

    #[test]
    fn exact_breakpoints_return_stored_rows(a in axis(), b in axis(), c in axis())
    {
        let axes = vec![a, b, c];
        let rows = grid_rows(&axes, &|x| vec![x[0] * 0.3 - x[1] * x[2], (x[0] + x[1]).sin(), 7.0 + x[2] / 3.0]);
        let table = LookupTable::from_data(rows.clone(), 3, names("x", 3), names("y", 3)).unwrap();
        for row in &rows
        {
            prop_assert_eq!(table.interpolate(&row[..3]).unwrap(), row[3..].to_vec());
        }
    }

    #[test]
    fn linear_between_adjacent_breakpoints(x in axis(), t in 0.001f64..0.999)
    {
        prop_assume!(x.len() >= 2);
        let rows = grid_rows(&[x.clone()], &|x| vec![x[0] * x[0] - 3.0, 2.0 * x[0]]);
        let table = LookupTable::from_data(rows.clone(), 1, names("x", 1), names("y", 2)).unwrap();
        for pair in rows.windows(2)
        {
            let (x0, x1) = (pair[0][0], pair[1][0]);
            let value = x0 + t * (x1 - x0);
            prop_assume!(value > x0 && value < x1);
            let ratio = (value - x0) / (x1 - x0);
            let result = table.interpolate(&[value]).unwrap();
            for i in 0..2
            {
                let expected = pair[0][1 + i] + ratio * (pair[1][1 + i] - pair[0][1 + i]);
                prop_assert!((result[i] - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            }
        }
    }

    #[test]
    fn flat_clamp_outside_range(x in axis(), below in 0.01f64..100.0, above in 0.0f64..100.0)
    {
        let rows = grid_rows(&[x.clone()], &|x| vec![x[0] + 1.0]);
        let table = LookupTable::from_data(rows.clone(), 1, names("x", 1), names("y", 1)).unwrap();
        let first = &rows[0];
        let last = &rows[rows.len() - 1];
        prop_assert_eq!(table.interpolate(&[first[0] - below]).unwrap(), first[1..].to_vec());
        prop_assert_eq!(table.interpolate(&[last[0] + above]).unwrap(), last[1..].to_vec());
    }
}

#[test]
fn bilinear_corners_and_centre()
{
    let rows = grid_rows(&[vec![0.5, 1.0], vec![0.0, 5.0]], &|x| vec![if x[0] == 0.5 { if x[1] == 0.0 { 0.1 } else { 0.3 } } else if x[1] == 0.0 { 0.2 } else { 0.5 }]);
    let table = LookupTable::from_data(rows, 2, vec!["Mach".into(), "Alpha".into()], vec!["CL".into()]).unwrap();
    assert_eq!(table.interpolate(&[0.5, 5.0]).unwrap(), vec![0.3]);
    let centre = table.interpolate(&[0.75, 2.5]).unwrap()[0];
    assert!((centre - 0.275).abs() < 1e-12);
}

#[test]
fn concurrent_queries_share_the_table()
{
    let rows = grid_rows(&[vec![0.0, 1.0, 2.0], vec![0.0, 10.0]], &|x| vec![x[0] + x[1]]);
    let table = std::sync::Arc::new(LookupTable::from_data(rows, 2, names("x", 2), names("y", 1)).unwrap());
    let handles: Vec<_> = (0..4).map(|i|
    {
        let table = table.clone();
        std::thread::spawn(move || table.interpolate(&[0.5 * i as f64, 5.0]).unwrap()[0])
    }).collect();
    for (i, handle) in handles.into_iter().enumerate()
    {
        let value = handle.join().unwrap();
        assert!((value - (0.5 * i as f64 + 5.0)).abs() < 1e-12);
    }
}
