use serde::ser::{SerializeMap, SerializeSeq};
use serde::{de, Deserialize, Serialize};
use std::fmt;

///
/// One row of a table: column name to cell value, kept in header order.
///
/// Column names are unique within a record. Serializes as a JSON object whose
/// keys appear in the same order as the header they were read from.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowRecord {
    fields: Vec<(String, String)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(column, value)` pairs; a repeated column keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.set(column, value);
        }
        record
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Overwrites the value of `column`, appending it when the record lacks it.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, column: K, value: V) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for RowRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

struct RowRecordVisitor;

impl<'de> de::Visitor<'de> for RowRecordVisitor {
    type Value = RowRecord;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an object of string cells")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut record = RowRecord::new();
        while let Some((column, value)) = access.next_entry::<String, String>()? {
            record.set(column, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for RowRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(RowRecordVisitor)
    }
}

///
/// An ordered sequence of rows sharing one header.
///
/// The header is kept separately so that a CSV with no data rows still knows
/// its columns. On the wire a dataset is just the array of its rows.
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<RowRecord>,
}

impl Dataset {
    /// Callers guarantee every row carries exactly `headers`, in that order.
    pub(crate) fn new(headers: Vec<String>, rows: Vec<RowRecord>) -> Self {
        let dataset = Dataset { headers, rows };
        debug_assert!(dataset.rows_match_headers());
        dataset
    }

    /// Takes the header from the first row. Empty input gives an empty dataset.
    pub fn from_rows(rows: Vec<RowRecord>) -> Self {
        let headers = rows
            .first()
            .map(|row| row.columns().map(String::from).collect())
            .unwrap_or_default();
        Dataset { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&RowRecord> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<RowRecord> {
        self.rows
    }

    fn rows_match_headers(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.columns().eq(self.headers.iter().map(String::as_str)))
    }
}

impl Serialize for Dataset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Vec::<RowRecord>::deserialize(deserializer).map(Dataset::from_rows)
    }
}

///
/// Serde form of a dataset that keeps its header next to the rows, for state that
/// must come back with the same columns even when there are no rows.
///
/// Use as `#[serde(with = "crate::record::framed")]` on an `Option<Dataset>`.
///
pub mod framed {
    use super::{Dataset, RowRecord};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct FramedRef<'a> {
        headers: &'a [String],
        rows: &'a [RowRecord],
    }

    #[derive(Deserialize)]
    struct Framed {
        headers: Vec<String>,
        rows: Vec<RowRecord>,
    }

    pub fn serialize<S>(dataset: &Option<Dataset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dataset
            .as_ref()
            .map(|dataset| FramedRef {
                headers: &dataset.headers,
                rows: &dataset.rows,
            })
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Dataset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Framed>::deserialize(deserializer)? {
            Some(Framed { headers, rows }) => {
                let dataset = Dataset { headers, rows };
                if dataset.rows_match_headers() {
                    Ok(Some(dataset))
                } else {
                    Err(de::Error::custom("rows do not match the dataset header"))
                }
            }
            None => Ok(None),
        }
    }
}
