use std::{cmp::Ordering, io::BufRead, path::Path};

use num_traits::{Float, NumCast};

use crate::{errors::LTError, utilities::tokenize::{tokenize, DEFAULT_DELIMITERS}};

///
/// Settings for reading table text.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderOptions
{
    /// Index of the token on line 0 that holds the independent-variable count.
    pub count_token: usize,
    /// Every character here separates columns; runs of them count as one.
    pub delimiters: String,
    /// Ignore data lines without any tokens instead of rejecting them. Off by default.
    pub skip_blank_lines: bool,
}

impl Default for LoaderOptions
{
    fn default() -> Self
    {
        Self { count_token: 2, delimiters: DEFAULT_DELIMITERS.to_string(), skip_blank_lines: false }
    }
}

impl LoaderOptions
{
    pub fn with_count_token(mut self, count_token: usize) -> Self
    {
        self.count_token = count_token;
        self
    }

    pub fn with_delimiters(mut self, delimiters: &str) -> Self
    {
        self.delimiters = delimiters.to_string();
        self
    }

    pub fn with_skip_blank_lines(mut self, skip: bool) -> Self
    {
        self.skip_blank_lines = skip;
        self
    }
}

///
/// Validated numeric rows, sorted by the independent columns, with the variable names.
/// Each row is `[independent.., dependent..]`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TableData<T>
{
    pub independent_names: Vec<String>,
    pub dependent_names: Vec<String>,
    pub rows: Vec<Vec<T>>,
}

/// Read and tokenize every line of the file at `path`.
pub fn read_file(path: &Path, options: &LoaderOptions) -> Result<Vec<Vec<String>>, LTError>
{
    tracing::info!(path = %path.display(), "reading table file");
    let file = std::fs::File::open(path).map_err(|source| match source.kind()
    {
        std::io::ErrorKind::NotFound => LTError::FileNotFound { path: path.to_path_buf() },
        _ => LTError::FileIO { path: path.to_path_buf(), source },
    })?;
    read_lines(std::io::BufReader::new(file), options)
        .map_err(|source| LTError::FileIO { path: path.to_path_buf(), source })
}

/// Tokenize every line produced by `reader`.
pub fn read_lines<R: BufRead>(reader: R, options: &LoaderOptions) -> Result<Vec<Vec<String>>, std::io::Error>
{
    reader.lines()
        .map(|line| line.map(|line| tokenize(&line, &options.delimiters).into_iter().map(String::from).collect()))
        .collect()
}

///
/// Turn tokenized table text into sorted numeric rows. Line 0 carries the
/// independent-variable count `k`, line 1 the column names (the first `k` independent),
/// and every following line one numeric row with as many columns as the header.
///
pub fn parse_rows<T: Float>(lines: &[Vec<String>], options: &LoaderOptions) -> Result<TableData<T>, LTError>
{
    let title = lines.first().ok_or_else(|| LTError::InvalidHeader { row: 1, reason: "table is empty".into() })?;
    let count_token = title.get(options.count_token).ok_or_else(|| LTError::InvalidHeader
    {
        row: 1,
        reason: format!("no token at index {} for the independent variable count", options.count_token),
    })?;
    let num_independent = parse_count(count_token).ok_or_else(|| LTError::InvalidHeader
    {
        row: 1,
        reason: format!("'{count_token}' is not a valid independent variable count"),
    })?;
    if num_independent == 0
    {
        return Err(LTError::InvalidHeader { row: 1, reason: "at least one independent variable is required".into() });
    }

    let header = lines.get(1).ok_or_else(|| LTError::InvalidHeader { row: 2, reason: "missing column names".into() })?;
    if header.len() <= num_independent
    {
        return Err(LTError::InvalidHeader
        {
            row: 2,
            reason: format!("{} columns cannot hold {num_independent} independent variables and a dependent one", header.len()),
        });
    }
    let (independent, dependent) = header.split_at(num_independent);
    let independent_names = independent.to_vec();
    let dependent_names = dependent.to_vec();
    tracing::info!(count = independent_names.len(), names = ?independent_names, "independent variables");
    tracing::info!(count = dependent_names.len(), names = ?dependent_names, "dependent variables");

    let width = header.len();
    let mut rows = Vec::with_capacity(lines.len().saturating_sub(2));
    for (index, line) in lines.iter().enumerate().skip(2)
    {
        let row = index + 1;
        if line.is_empty() && options.skip_blank_lines
        {
            continue;
        }
        if line.len() != width
        {
            return Err(LTError::Format { row, expected: width, actual: line.len() });
        }
        let values = line.iter().enumerate().map(|(column, token)|
        {
            token.parse::<f64>().ok()
                .and_then(|value| <T as NumCast>::from(value))
                .ok_or_else(|| LTError::Parse { row, column, token: token.clone() })
        }).collect::<Result<Vec<T>, LTError>>()?;
        check_breakpoints(&values, num_independent, row)?;
        rows.push(values);
    }
    if rows.is_empty()
    {
        return Err(LTError::Format { row: lines.len() + 1, expected: width, actual: 0 });
    }
    tracing::debug!(rows = rows.len(), "sorting data by the independent variables");
    sort_rows(&mut rows, num_independent);
    Ok(TableData { independent_names, dependent_names, rows })
}

///
/// Validate an in-memory matrix the same way file rows are validated, then sort it.
/// Row numbers in errors are 0-based matrix indices.
///
pub fn validate_data<T: Float>(mut rows: Vec<Vec<T>>, num_independent: usize, independent_names: Vec<String>, dependent_names: Vec<String>) -> Result<TableData<T>, LTError>
{
    if num_independent == 0
    {
        return Err(LTError::InvalidHeader { row: 0, reason: "at least one independent variable is required".into() });
    }
    if independent_names.len() != num_independent
    {
        return Err(LTError::DimensionMismatch { expected: num_independent, actual: independent_names.len() });
    }
    if dependent_names.is_empty()
    {
        return Err(LTError::InvalidHeader { row: 0, reason: "at least one dependent variable is required".into() });
    }
    let width = num_independent + dependent_names.len();
    if rows.is_empty()
    {
        return Err(LTError::Format { row: 0, expected: width, actual: 0 });
    }
    for (row, values) in rows.iter().enumerate()
    {
        if values.len() != width
        {
            return Err(LTError::Format { row, expected: width, actual: values.len() });
        }
        check_breakpoints(values, num_independent, row)?;
    }
    sort_rows(&mut rows, num_independent);
    Ok(TableData { independent_names, dependent_names, rows })
}

/// A non-negative integer, also written as an integral real such as `2.0`.
fn parse_count(token: &str) -> Option<usize>
{
    token.parse::<usize>().ok().or_else(||
    {
        let value = token.parse::<f64>().ok()?;
        (value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64).then_some(value as usize)
    })
}

fn check_breakpoints<T: Float>(values: &[T], num_independent: usize, row: usize) -> Result<(), LTError>
{
    match values[..num_independent].iter().position(|x| !x.is_finite())
    {
        Some(column) => Err(LTError::InvalidBreakpoint { row, column }),
        None => Ok(()),
    }
}

///
/// Stable sort by the first `num_independent` columns, compared left to right. Rows with
/// identical independent values keep their input order.
///
pub fn sort_rows<T: Float>(rows: &mut [Vec<T>], num_independent: usize)
{
    rows.sort_by(|a, b|
    {
        a[..num_independent].iter().zip(&b[..num_independent])
            .map(|(x, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal))
            .find(|order| *order != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
fn lines(text: &str) -> Vec<Vec<String>>
{
    crate::utilities::tokenize::tokenize_lines(text, DEFAULT_DELIMITERS)
}

#[test]
fn check_parse_and_sort()
{
    let text = "drag table 2\nMach Alpha CD CL\n1.0 0 0.3 0.4\n0.5,5;0.2\t0.6\n0.5 0 0.1 0.2\n";
    let data: TableData<f64> = parse_rows(&lines(text), &LoaderOptions::default()).unwrap();
    assert_eq!(data.independent_names, vec!["Mach", "Alpha"]);
    assert_eq!(data.dependent_names, vec!["CD", "CL"]);
    assert_eq!(data.rows, vec![
        vec![0.5, 0.0, 0.1, 0.2],
        vec![0.5, 5.0, 0.2, 0.6],
        vec![1.0, 0.0, 0.3, 0.4],
    ]);
}

#[test]
fn check_sort_is_stable()
{
    let mut rows = vec![vec![2.0, 1.0], vec![1.0, 7.0], vec![2.0, 2.0], vec![1.0, 3.0]];
    sort_rows(&mut rows, 1);
    assert_eq!(rows, vec![vec![1.0, 7.0], vec![1.0, 3.0], vec![2.0, 1.0], vec![2.0, 2.0]]);
}

#[test]
fn check_format_error_row()
{
    let text = "t t 1\nx y\n1 2\n3\n";
    match parse_rows::<f64>(&lines(text), &LoaderOptions::default())
    {
        Err(LTError::Format { row, expected, actual }) =>
        {
            assert_eq!(row, 4);
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn check_blank_lines_rejected_by_default()
{
    let text = "t t 1\nx y\n1 2\n\n3 4\n";
    assert!(matches!(parse_rows::<f64>(&lines(text), &LoaderOptions::default()), Err(LTError::Format { row: 4, expected: 2, actual: 0 })));

    let options = LoaderOptions::default().with_skip_blank_lines(true);
    let data = parse_rows::<f64>(&lines(text), &options).unwrap();
    assert_eq!(data.rows, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
}

#[test]
fn check_integral_count_token()
{
    let options = LoaderOptions::default();
    for title in ["t t 1.0", "t t +1", "t t 1"]
    {
        let text = format!("{title}\nx y\n1 2\n");
        let data = parse_rows::<f64>(&lines(&text), &options).unwrap();
        assert_eq!(data.independent_names, vec!["x"]);
    }
}

#[test]
fn check_parse_errors()
{
    let text = "t t 1\nx y\n1 abc\n";
    match parse_rows::<f64>(&lines(text), &LoaderOptions::default())
    {
        Err(LTError::Parse { row, column, token }) =>
        {
            assert_eq!((row, column), (3, 1));
            assert_eq!(token, "abc");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    let text = "t t 1\nx y\nNaN 1\n";
    assert!(matches!(parse_rows::<f64>(&lines(text), &LoaderOptions::default()), Err(LTError::InvalidBreakpoint { row: 3, column: 0 })));
}

#[test]
fn check_header_errors()
{
    let options = LoaderOptions::default();
    assert!(matches!(parse_rows::<f64>(&[], &options), Err(LTError::InvalidHeader { row: 1, .. })));
    assert!(matches!(parse_rows::<f64>(&lines("t t\nx y\n1 2\n"), &options), Err(LTError::InvalidHeader { row: 1, .. })));
    assert!(matches!(parse_rows::<f64>(&lines("t t two\nx y\n1 2\n"), &options), Err(LTError::InvalidHeader { row: 1, .. })));
    assert!(matches!(parse_rows::<f64>(&lines("t t 0\nx y\n1 2\n"), &options), Err(LTError::InvalidHeader { row: 1, .. })));
    assert!(matches!(parse_rows::<f64>(&lines("t t 2\nx y\n1 2\n"), &options), Err(LTError::InvalidHeader { row: 2, .. })));
    assert!(matches!(parse_rows::<f64>(&lines("t t 1\nx y\n"), &options), Err(LTError::Format { row: 3, expected: 2, actual: 0 })));
    assert!(matches!(parse_rows::<f64>(&lines("t t 1.5\nx y\n1 2\n"), &options), Err(LTError::InvalidHeader { row: 1, .. })));
    let options = options.with_count_token(0);
    assert!(parse_rows::<f64>(&lines("1\nx y\n1 2\n"), &options).is_ok());
}

#[test]
fn check_validate_data()
{
    fn names(list: &[&str]) -> Vec<String>
    {
        list.iter().map(|s| s.to_string()).collect()
    }
    let data = validate_data(vec![vec![2.0, 1.0], vec![1.0, 0.0]], 1, names(&["x"]), names(&["y"])).unwrap();
    assert_eq!(data.rows, vec![vec![1.0, 0.0], vec![2.0, 1.0]]);
    assert!(matches!(validate_data(vec![vec![1.0, 2.0], vec![1.0]], 1, names(&["x"]), names(&["y"])), Err(LTError::Format { row: 1, expected: 2, actual: 1 })));
    assert!(matches!(validate_data(vec![vec![1.0, 2.0]], 2, names(&["x"]), names(&["y"])), Err(LTError::DimensionMismatch { expected: 2, actual: 1 })));
    assert!(matches!(validate_data(Vec::<Vec<f64>>::new(), 1, names(&["x"]), names(&["y"])), Err(LTError::Format { row: 0, .. })));
    assert!(matches!(validate_data(vec![vec![f64::INFINITY, 2.0]], 1, names(&["x"]), names(&["y"])), Err(LTError::InvalidBreakpoint { row: 0, column: 0 })));
}
