use std::collections::{HashMap, hash_map};
use std::fmt::{self, Debug, Display};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tokio_sqlite::Value;

/// Separator joining the two participants of a chat identifier.
///
/// Raw user identifiers never contain it, which keeps chat identifiers
/// collision-free.
pub const CHAT_ID_SEPARATOR: char = '_';

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Validate a raw identifier: it must be non-empty and must not contain
    /// the chat identifier separator.
    pub fn parse(raw: impl Into<String>) -> Result<Self, anyhow::Error> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(anyhow!("User id is empty"));
        }
        if raw.contains(CHAT_ID_SEPARATOR) {
            return Err(anyhow!(
                "User id '{}' contains reserved separator '{}'",
                raw,
                CHAT_ID_SEPARATOR
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic identifier of the conversation between two users.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Resolve the chat identifier of a pair of users.
    ///
    /// Symmetric: `resolve(a, b) == resolve(b, a)`. Both ids are expected to be
    /// validated by [`UserId::parse`].
    pub fn resolve(a: &UserId, b: &UserId) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let mut id = String::with_capacity(first.0.len() + second.0.len() + 1);
        id.push_str(&first.0);
        id.push(CHAT_ID_SEPARATOR);
        id.push_str(&second.0);
        Self(id)
    }

    /// Wrap an identifier read back from storage.
    pub fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    /// Whether `user` is one of the two participants.
    pub fn involves(&self, user: &UserId) -> bool {
        self.0
            .split_once(CHAT_ID_SEPARATOR)
            .map(|(a, b)| a == user.as_str() || b == user.as_str())
            .unwrap_or(false)
    }

    /// The participant that is not `user`.
    pub fn peer_of(&self, user: &UserId) -> Option<UserId> {
        let (a, b) = self.0.split_once(CHAT_ID_SEPARATOR)?;
        if a == user.as_str() {
            Some(UserId(b.to_string()))
        } else if b == user.as_str() {
            Some(UserId(a.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Allocate a fresh time-ordered identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned timestamp in microseconds since the Unix epoch.
///
/// Values outside the calendar range chrono can represent are kept as-is and
/// treated as malformed by [`Timestamp::to_utc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_micros())
    }

    pub fn from_utc(datetime: chrono::DateTime<chrono::Utc>) -> Self {
        Self(datetime.timestamp_micros())
    }

    pub fn micros(&self) -> i64 {
        self.0
    }

    pub fn to_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::<chrono::Utc>::from_timestamp_micros(self.0)
    }
}

#[derive(Clone)]
pub struct ColumnIndex {
    column_map: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn builder() -> ColumnIndexBuilder {
        ColumnIndexBuilder {
            column_map: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.column_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_map.is_empty()
    }

    pub fn get(&self, name: impl AsRef<str>) -> Option<usize> {
        self.column_map.get(name.as_ref()).cloned()
    }

    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![String::new(); self.column_map.len()];
        for (name, index) in self.column_map.iter() {
            columns[*index] = name.clone();
        }
        columns
    }

    /// Look up a column value, failing when the column is unknown or the row
    /// is shorter than the index.
    pub fn value<'v>(&self, values: &'v [Value], name: &str) -> Result<&'v Value, anyhow::Error> {
        self.get(name)
            .and_then(|index| values.get(index))
            .ok_or_else(|| anyhow!("Missing column '{}'", name))
    }

    pub fn set_value(
        &self,
        values: &mut [Value],
        name: impl AsRef<str>,
        value: impl Into<Value>,
    ) -> bool {
        assert_eq!(
            self.len(),
            values.len(),
            "Columns length differs from values length"
        );
        match self.get(name) {
            Some(index) => values
                .get_mut(index)
                .map(|v| {
                    *v = value.into();
                    true
                })
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn new_values(&self) -> Vec<Value> {
        vec![Value::Null; self.len()]
    }

    /// Quoted, comma separated column list for SQL statements.
    pub fn format_columns(&self) -> String {
        self.columns()
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `?1, ?2, ...` placeholders matching the column list.
    pub fn format_placeholders(&self) -> String {
        (1..=self.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Debug for ColumnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ColumnIndex").field(&self.columns()).finish()
    }
}

pub struct ColumnIndexBuilder {
    column_map: HashMap<String, usize>,
}

impl ColumnIndexBuilder {
    pub fn add(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let index = self.column_map.len();
        if let hash_map::Entry::Vacant(entry) = self.column_map.entry(name) {
            entry.insert(index);
        }
        self
    }

    pub fn build(&mut self) -> ColumnIndex {
        let column_map = std::mem::take(&mut self.column_map);
        ColumnIndex { column_map }
    }
}

pub(super) fn value_as_i64(v: &Value) -> Result<i64, anyhow::Error> {
    match v {
        Value::Integer(i) => Ok(*i),
        _ => Err(anyhow!("Expected Integer for i64")),
    }
}

pub(super) fn value_as_string(v: &Value) -> Result<String, anyhow::Error> {
    match v {
        Value::Text(s) => Ok(s.clone()),
        _ => Err(anyhow!("Expected Text for String")),
    }
}

pub(super) fn value_as_i64_opt(v: &Value) -> Result<Option<i64>, anyhow::Error> {
    match v {
        Value::Null => Ok(None),
        v => value_as_i64(v).map(Some),
    }
}

pub(crate) fn value_as_string_opt(v: &Value) -> Result<Option<String>, anyhow::Error> {
    match v {
        Value::Null => Ok(None),
        v => value_as_string(v).map(Some),
    }
}

pub(super) fn value_as_u32_opt(v: &Value) -> Result<Option<u32>, anyhow::Error> {
    match value_as_i64_opt(v)? {
        Some(i) => u32::try_from(i)
            .map(Some)
            .map_err(|_| anyhow!("Expected non-negative Integer for u32")),
        None => Ok(None),
    }
}
