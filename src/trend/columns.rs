use crate::error::{Result, TrendError};
use std::collections::{BTreeSet, HashMap};

/// An output column and the extensions summed into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub label: String,
    pub members: BTreeSet<String>,
}

impl Column {
    /// Parse `.go` or `.m+.h`. The spec string itself is the label.
    pub fn parse(spec: &str) -> Result<Self> {
        let members: BTreeSet<String> = spec.split('+').map(str::to_string).collect();
        if members.iter().any(String::is_empty) {
            return Err(TrendError::InvalidColumn(spec.to_string()));
        }
        Ok(Self {
            label: spec.to_string(),
            members,
        })
    }
}

/// Maps a file extension to the label of the column it contributes to.
///
/// Without columns every extension is its own column, which is what surveying
/// and `--list` need.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapper {
    columns: Vec<Column>,
    ext_to_label: Option<HashMap<String, usize>>,
}

impl ColumnMapper {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        if specs.is_empty() {
            return Ok(Self::identity());
        }

        let mut columns = Vec::with_capacity(specs.len());
        let mut ext_to_label: HashMap<String, usize> = HashMap::new();
        for spec in specs {
            let column = Column::parse(spec.as_ref())?;
            let index = columns.len();
            for ext in &column.members {
                if let Some(&owner) = ext_to_label.get(ext) {
                    let first: &Column = &columns[owner];
                    return Err(TrendError::DuplicateExtension {
                        extension: ext.clone(),
                        first: first.label.clone(),
                        second: column.label.clone(),
                    });
                }
                ext_to_label.insert(ext.clone(), index);
            }
            columns.push(column);
        }

        Ok(Self {
            columns,
            ext_to_label: Some(ext_to_label),
        })
    }

    pub fn is_identity(&self) -> bool {
        self.ext_to_label.is_none()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    /// Column label for `ext`, or `None` if no requested column wants it.
    pub fn column_for<'a>(&'a self, ext: &'a str) -> Option<&'a str> {
        match &self.ext_to_label {
            None => Some(ext),
            Some(map) => map.get(ext).map(|&i| self.columns[i].label.as_str()),
        }
    }
}
