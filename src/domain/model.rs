use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Field names from row 1 of a table, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    names: Vec<String>,
}

impl HeaderRow {
    /// Keeps the contiguous populated run of cells starting at the first one.
    /// Returns `None` when the first cell is empty.
    pub fn from_cells<I, T>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let names: Vec<String> = cells
            .into_iter()
            .map(Into::into)
            .take_while(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Form parameters of one request. Repeated keys keep their first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    parameters: HashMap<String, String>,
}

impl Submission {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut parameters = HashMap::new();
        for (key, value) in pairs {
            parameters.entry(key.into()).or_insert_with(|| value.into());
        }
        Self { parameters }
    }

    /// Merges a raw query string and a form-encoded body. Query parameters
    /// are read first, so they win over body parameters with the same key.
    pub fn from_query_and_body(query: Option<&str>, body: &[u8]) -> Self {
        let query = query.unwrap_or_default().as_bytes();
        let pairs = url::form_urlencoded::parse(query)
            .chain(url::form_urlencoded::parse(body))
            .map(|(key, value)| (key.into_owned(), value.into_owned()));
        Self::from_pairs(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Timestamp(DateTime<Utc>),
    /// The request had no parameter for this column.
    Empty,
}

impl Cell {
    /// Text written into the table for this cell.
    pub fn to_table_value(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Timestamp(at) => format_timestamp(at),
            Cell::Empty => String::new(),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(text) => serializer.serialize_str(text),
            Cell::Timestamp(at) => serializer.serialize_str(&format_timestamp(at)),
            Cell::Empty => serializer.serialize_none(),
        }
    }
}

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutputRow {
    cells: Vec<Cell>,
}

impl OutputRow {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn to_table_values(&self) -> Vec<String> {
        self.cells.iter().map(Cell::to_table_value).collect()
    }
}

/// Body of a successful response: `{"result":"success","row":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgment {
    pub result: &'static str,
    pub row: OutputRow,
}

impl Acknowledgment {
    pub fn success(row: OutputRow) -> Self {
        Self {
            result: "success",
            row,
        }
    }
}
