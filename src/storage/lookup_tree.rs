use std::fmt::{Display, Write};

use num_traits::Float;
use serde::Serialize;

use crate::errors::LTError;

/// What hangs below a node's breakpoints, index-aligned with them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum NodeData<T>
{
    /// One sub-tree per breakpoint over the remaining independent variables.
    Children(Vec<LookupNode<T>>),
    /// One dependent-variable row per breakpoint (innermost variable).
    Leaf(Vec<Vec<T>>),
}

///
/// A single level of the lookup tree. Each node indexes one independent variable by a
/// strictly ascending set of breakpoints and exclusively owns everything below it.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LookupNode<T>
{
    breakpoints: Vec<T>,
    variable: String,
    dependent_names: Vec<String>,
    data: NodeData<T>,
}

impl<T: Float> LookupNode<T>
{
    ///
    /// Build a tree from rows laid out as `[independent.., dependent..]` and sorted
    /// ascending by the independent columns (first column is the primary key).
    /// Rows sharing every independent value collapse onto the first of them.
    ///
    pub fn build(rows: &[Vec<T>], independent_names: &[String], dependent_names: &[String]) -> Result<Self, LTError>
    {
        if independent_names.is_empty()
        {
            return Err(LTError::InvariantViolation("at least one independent variable is required".into()));
        }
        let width = independent_names.len() + dependent_names.len();
        if let Some(row) = rows.iter().find(|row| row.len() != width)
        {
            return Err(LTError::DimensionMismatch { expected: width, actual: row.len() });
        }
        Self::build_level(rows, 0, independent_names, dependent_names)
    }

    fn build_level(rows: &[Vec<T>], column: usize, independent_names: &[String], dependent_names: &[String]) -> Result<Self, LTError>
    {
        let variable = &independent_names[column];
        if rows.is_empty()
        {
            return Err(LTError::InvariantViolation(format!("empty partition for '{variable}'")));
        }
        let num_independent = independent_names.len();
        // Sorted input keeps rows sharing this column's value contiguous.
        let groups = rows.chunk_by(|a, b| a[column] == b[column]);
        let mut breakpoints = Vec::new();
        let data = if column + 1 == num_independent
        {
            let mut leaf_rows = Vec::new();
            for group in groups
            {
                if group.len() > 1
                {
                    tracing::warn!(variable = %variable, dropped = group.len() - 1, "duplicate independent values, keeping first row");
                }
                breakpoints.push(group[0][column]);
                leaf_rows.push(group[0][num_independent..].to_vec());
            }
            NodeData::Leaf(leaf_rows)
        }
        else
        {
            let mut children = Vec::new();
            for group in groups
            {
                breakpoints.push(group[0][column]);
                children.push(Self::build_level(group, column + 1, independent_names, dependent_names)?);
            }
            NodeData::Children(children)
        };
        if breakpoints.windows(2).any(|pair| pair[0].partial_cmp(&pair[1]) != Some(std::cmp::Ordering::Less))
        {
            return Err(LTError::InvariantViolation(format!("breakpoints of '{variable}' are not strictly ascending")));
        }
        Ok(Self
        {
            breakpoints,
            variable: variable.clone(),
            dependent_names: dependent_names.to_vec(),
            data,
        })
    }

    /// Number of independent variables consumed from this node down to the leaves.
    pub fn depth(&self) -> usize
    {
        match &self.data
        {
            NodeData::Children(children) => 1 + children.first().map_or(0, |child| child.depth()),
            NodeData::Leaf(_) => 1,
        }
    }
}

impl<T> LookupNode<T>
{
    pub fn breakpoints(&self) -> &[T]
    {
        &self.breakpoints
    }

    /// Name of the independent variable indexed at this level.
    pub fn variable(&self) -> &str
    {
        &self.variable
    }

    pub fn dependent_names(&self) -> &[String]
    {
        &self.dependent_names
    }

    pub fn data(&self) -> &NodeData<T>
    {
        &self.data
    }

    pub fn children(&self) -> Option<&[LookupNode<T>]>
    {
        match &self.data
        {
            NodeData::Children(children) => Some(children),
            NodeData::Leaf(_) => None,
        }
    }

    pub fn leaf_rows(&self) -> Option<&[Vec<T>]>
    {
        match &self.data
        {
            NodeData::Leaf(rows) => Some(rows),
            NodeData::Children(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool
    {
        matches!(self.data, NodeData::Leaf(_))
    }

    pub fn len(&self) -> usize
    {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.breakpoints.is_empty()
    }
}

impl<T: Display> LookupNode<T>
{
    ///
    /// Write an indented dump of this sub-tree, `indent` spaces deep. Leaves start with a
    /// header line naming the variable and the dependent columns.
    ///
    pub(crate) fn write_structure<W: Write>(&self, out: &mut W, indent: usize) -> std::fmt::Result
    {
        let pad = " ".repeat(indent);
        match &self.data
        {
            NodeData::Leaf(rows) =>
            {
                writeln!(out, "{pad}{} {}", self.variable, self.dependent_names.join(" "))?;
                for (x, row) in self.breakpoints.iter().zip(rows)
                {
                    write!(out, "{pad}{} = {x} :", self.variable)?;
                    for value in row
                    {
                        write!(out, " {value}")?;
                    }
                    writeln!(out)?;
                }
            }
            NodeData::Children(children) =>
            {
                for (x, child) in self.breakpoints.iter().zip(children)
                {
                    writeln!(out, "{pad}{} = {x} :", self.variable)?;
                    child.write_structure(out, indent + 3)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
fn names(list: &[&str]) -> Vec<String>
{
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn check_build_two_level_tree()
{
    let rows = vec![
        vec![0.5, 0.0, 0.1],
        vec![0.5, 5.0, 0.3],
        vec![1.0, 0.0, 0.2],
        vec![1.0, 5.0, 0.5],
    ];
    let root = LookupNode::build(&rows, &names(&["Mach", "Alpha"]), &names(&["CL"])).unwrap();
    assert_eq!(root.depth(), 2);
    assert_eq!(root.variable(), "Mach");
    assert_eq!(root.breakpoints(), &[0.5, 1.0]);
    assert!(root.leaf_rows().is_none());
    let children = root.children().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].variable(), "Alpha");
    assert_eq!(children[1].breakpoints(), &[0.0, 5.0]);
    assert_eq!(children[1].leaf_rows().unwrap(), &[vec![0.2], vec![0.5]]);
    assert_eq!(children[1].dependent_names(), &["CL".to_string()]);
}

#[test]
fn check_build_keeps_first_duplicate()
{
    let rows = vec![vec![1.0, 10.0], vec![1.0, 20.0], vec![2.0, 30.0]];
    let root = LookupNode::build(&rows, &names(&["x"]), &names(&["y"])).unwrap();
    assert_eq!(root.breakpoints(), &[1.0, 2.0]);
    assert_eq!(root.leaf_rows().unwrap(), &[vec![10.0], vec![30.0]]);
}

#[test]
fn check_build_rejects_bad_input()
{
    let empty: Vec<Vec<f64>> = Vec::new();
    assert!(matches!(LookupNode::build(&empty, &names(&["x"]), &names(&["y"])), Err(LTError::InvariantViolation(_))));

    let unsorted = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
    assert!(matches!(LookupNode::build(&unsorted, &names(&["x"]), &names(&["y"])), Err(LTError::InvariantViolation(_))));

    let ragged = vec![vec![1.0, 1.0], vec![2.0]];
    assert!(matches!(LookupNode::build(&ragged, &names(&["x"]), &names(&["y"])), Err(LTError::DimensionMismatch { expected: 2, actual: 1 })));
}

#[test]
fn check_structure_dump()
{
    let rows = vec![vec![1.0, 0.0, 3.0], vec![1.0, 1.0, 4.0]];
    let root = LookupNode::build(&rows, &names(&["a", "b"]), &names(&["c"])).unwrap();
    let mut out = String::new();
    root.write_structure(&mut out, 0).unwrap();
    assert_eq!(out, "a = 1 :\n   b c\n   b = 0 : 3\n   b = 1 : 4\n");
}
