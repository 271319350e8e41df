use std::{fmt::Display, io::BufRead, path::{Path, PathBuf}};

use num_traits::Float;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;

use crate::{algorithms::{interpolation, trace::{NoTrace, TraceSink}}, errors::LTError, loader::{self, LoaderOptions, TableData}, storage::lookup_tree::LookupNode};

///
/// A multi-dimensional lookup table. Rows of tabulated data are organised into a tree
/// with one level per independent variable, and queried by multilinear interpolation
/// with flat clamping outside the tabulated range.
///
/// The table is immutable once built, so it can be shared between threads and queried
/// concurrently.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LookupTable<T = f64>
{
    independent_names: Vec<String>,
    dependent_names: Vec<String>,
    root: LookupNode<T>,
}

impl<T: Float> LookupTable<T>
{
    /// Load a table file with the default delimiters and header layout.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LTError>
    {
        Self::from_file_with_options(path, &LoaderOptions::default())
    }

    pub fn from_file_with_options<P: AsRef<Path>>(path: P, options: &LoaderOptions) -> Result<Self, LTError>
    {
        let lines = loader::read_file(path.as_ref(), options)?;
        let table = Self::from_rows(&lines, options)?;
        tracing::info!(path = %path.as_ref().display(), "table loaded");
        Ok(table)
    }

    /// Load a table from any buffered source of text, e.g. a byte slice.
    pub fn from_reader<R: BufRead>(reader: R, options: &LoaderOptions) -> Result<Self, LTError>
    {
        let lines = loader::read_lines(reader, options).map_err(|source| LTError::FileIO { path: PathBuf::from("<reader>"), source })?;
        Self::from_rows(&lines, options)
    }

    /// Build from already tokenized lines laid out like a table file.
    pub fn from_rows(lines: &[Vec<String>], options: &LoaderOptions) -> Result<Self, LTError>
    {
        Self::from_table_data(loader::parse_rows(lines, options)?)
    }

    ///
    /// Build from an in-memory matrix whose rows hold `num_independent` independent values
    /// followed by the dependent values. Rows need not be sorted.
    ///
    pub fn from_data(rows: Vec<Vec<T>>, num_independent: usize, independent_names: Vec<String>, dependent_names: Vec<String>) -> Result<Self, LTError>
    {
        Self::from_table_data(loader::validate_data(rows, num_independent, independent_names, dependent_names)?)
    }

    fn from_table_data(data: TableData<T>) -> Result<Self, LTError>
    {
        let root = LookupNode::build(&data.rows, &data.independent_names, &data.dependent_names)?;
        tracing::debug!(rows = data.rows.len(), depth = root.depth(), "lookup tree built");
        Ok(Self { independent_names: data.independent_names, dependent_names: data.dependent_names, root })
    }

    ///
    /// Interpolate all dependent variables at `x`, one value per independent variable in
    /// table order.
    ///
    #[inline]
    pub fn interpolate(&self, x: &[T]) -> Result<Vec<T>, LTError>
    {
        self.interpolate_traced(x, &mut NoTrace)
    }

    /// Interpolate while reporting every bracketing and blending step to `sink`.
    pub fn interpolate_traced<S: TraceSink<T>>(&self, x: &[T], sink: &mut S) -> Result<Vec<T>, LTError>
    {
        interpolation::interpolate(&self.root, x, sink)
    }

    /// Interpolate a single dependent variable by name.
    pub fn interpolate_variable(&self, x: &[T], name: &str) -> Result<T, LTError>
    {
        let index = self.dependent_index(name).ok_or_else(|| LTError::UnknownVariable(name.to_string()))?;
        Ok(self.interpolate(x)?[index])
    }

    pub fn dependent_index(&self, name: &str) -> Option<usize>
    {
        self.dependent_names.iter().position(|n| n == name)
    }

    pub fn independent_names(&self) -> &[String]
    {
        &self.independent_names
    }

    pub fn dependent_names(&self) -> &[String]
    {
        &self.dependent_names
    }

    pub fn num_independent(&self) -> usize
    {
        self.independent_names.len()
    }

    pub fn num_dependent(&self) -> usize
    {
        self.dependent_names.len()
    }

    pub fn root(&self) -> &LookupNode<T>
    {
        &self.root
    }
}

impl<T: Float + Send + Sync> LookupTable<T>
{
    /// Interpolate many points in parallel. Each query succeeds or fails on its own.
    pub fn interpolate_batch(&self, x: &[Vec<T>]) -> Vec<Result<Vec<T>, LTError>>
    {
        x.par_iter().map(|x| self.interpolate(x)).collect()
    }
}

impl<T: Display> Display for LookupTable<T>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        writeln!(f, "independent variables: {}", self.independent_names.join(", "))?;
        writeln!(f, "dependent variables: {}", self.dependent_names.join(", "))?;
        self.root.write_structure(f, 0)
    }
}

#[cfg(test)]
const MACH_TABLE: &str = "drag coefficient 1\nMach CD\n0.5 0.02\n1.0 0.04\n1.5 0.03\n";

#[cfg(test)]
const LIFT_TABLE: &str = "lift coefficient 2\nMach Alpha CL CD\n1.0,5,0.5,0.05\n0.5,0,0.1,0.01\n1.0,0,0.2,0.02\n0.5,5,0.3,0.03\n";

#[test]
fn check_mach_scenarios()
{
    let table: LookupTable = LookupTable::from_reader(MACH_TABLE.as_bytes(), &LoaderOptions::default()).unwrap();
    assert_eq!(table.num_independent(), 1);
    assert_eq!(table.dependent_names(), &["CD".to_string()]);
    assert!((table.interpolate(&[0.75]).unwrap()[0] - 0.03).abs() < 1e-12);
    assert_eq!(table.interpolate(&[0.2]).unwrap(), vec![0.02]);
    assert_eq!(table.interpolate(&[2.0]).unwrap(), vec![0.03]);
    assert_eq!(table.interpolate_variable(&[1.0], "CD").unwrap(), 0.04);
    assert!(matches!(table.interpolate_variable(&[1.0], "CL"), Err(LTError::UnknownVariable(_))));
}

#[test]
fn check_bilinear()
{
    let table: LookupTable = LookupTable::from_reader(LIFT_TABLE.as_bytes(), &LoaderOptions::default()).unwrap();
    assert_eq!(table.independent_names(), &["Mach".to_string(), "Alpha".to_string()]);
    let result = table.interpolate(&[0.75, 2.5]).unwrap();
    let expected = 0.25 * (0.1 + 0.3 + 0.2 + 0.5);
    assert!((result[0] - expected).abs() < 1e-12);
    assert!((result[1] - 0.0275).abs() < 1e-12);
    assert_eq!(table.interpolate(&[1.0, 0.0]).unwrap(), vec![0.2, 0.02]);
    assert!(matches!(table.interpolate(&[1.0]), Err(LTError::DimensionMismatch { expected: 2, actual: 1 })));
}

#[test]
fn check_short_row_aborts_load()
{
    let text = "drag coefficient 1\nMach CD\n0.5 0.02\n1.0\n1.5 0.03\n";
    let result = LookupTable::<f64>::from_reader(text.as_bytes(), &LoaderOptions::default());
    match result
    {
        Err(err) =>
        {
            assert!(err.is_format_error());
            assert!(matches!(err, LTError::Format { row: 4, expected: 2, actual: 1 }));
        }
        Ok(_) => panic!("short row must not produce a table"),
    }
}

#[test]
fn check_from_file()
{
    let path = std::env::temp_dir().join(format!("lutrust_{}_lift.dat", std::process::id()));
    std::fs::write(&path, LIFT_TABLE).unwrap();
    let table = LookupTable::<f64>::from_file(&path);
    std::fs::remove_file(&path).unwrap();
    let table = table.unwrap();
    assert_eq!(table.interpolate(&[0.5, 5.0]).unwrap(), vec![0.3, 0.03]);

    let missing = std::env::temp_dir().join("lutrust_missing_table.dat");
    assert!(matches!(LookupTable::<f64>::from_file(&missing), Err(LTError::FileNotFound { .. })));
}

#[test]
fn check_from_data_and_batch()
{
    let rows = vec![
        vec![1.0, 0.0, 10.0],
        vec![0.0, 1.0, 1.0],
        vec![0.0, 0.0, 0.0],
        vec![1.0, 1.0, 11.0],
    ];
    let table = LookupTable::from_data(rows, 2, vec!["x".into(), "y".into()], vec!["z".into()]).unwrap();
    let queries = vec![vec![0.5, 0.5], vec![2.0, -1.0], vec![0.5]];
    let results = table.interpolate_batch(&queries);
    assert!((results[0].as_ref().unwrap()[0] - 5.5).abs() < 1e-12);
    assert_eq!(results[1].as_ref().unwrap(), &vec![10.0]);
    assert!(matches!(results[2], Err(LTError::DimensionMismatch { .. })));
}

#[test]
fn check_f32_table()
{
    let table: LookupTable<f32> = LookupTable::from_reader(MACH_TABLE.as_bytes(), &LoaderOptions::default()).unwrap();
    assert!((table.interpolate(&[0.75]).unwrap()[0] - 0.03).abs() < 1e-6);
}

#[test]
fn check_display_and_serialize()
{
    let table: LookupTable = LookupTable::from_reader(MACH_TABLE.as_bytes(), &LoaderOptions::default()).unwrap();
    let dump = table.to_string();
    assert!(dump.starts_with("independent variables: Mach\ndependent variables: CD\nMach CD\n"));
    assert!(dump.contains("Mach = 1.5 : 0.03\n"));

    let json = serde_json::to_value(&table).unwrap();
    assert_eq!(json["independent_names"][0], "Mach");
    assert_eq!(json["root"]["breakpoints"], serde_json::json!([0.5, 1.0, 1.5]));
    assert_eq!(json["root"]["data"]["Leaf"][1], serde_json::json!([0.04]));
}

#[test]
fn check_closure_trace_sink()
{
    use crate::algorithms::trace::TraceEvent;
    let table: LookupTable = LookupTable::from_reader(LIFT_TABLE.as_bytes(), &LoaderOptions::default()).unwrap();
    let mut variables = Vec::new();
    let mut blends = 0;
    let result = table.interpolate_traced(&[0.75, 2.5], &mut |e: &TraceEvent<'_, f64>|
    {
        match e
        {
            TraceEvent::Descend { variable, .. } => variables.push(variable.to_string()),
            TraceEvent::Blend { .. } => blends += 1,
            _ => {}
        }
    }).unwrap();
    assert_eq!(result, table.interpolate(&[0.75, 2.5]).unwrap());
    assert_eq!(variables, vec!["Mach", "Alpha", "Alpha"]);
    assert_eq!(blends, 3);
}
