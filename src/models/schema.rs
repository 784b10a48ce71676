use serde::ser::{Serialize, SerializeMap, Serializer};

/// Table name to ordered column names, in insertion order.
///
/// Replacing an existing table keeps its position and swaps its columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the columns of `table`.
    pub fn upsert(&mut self, table: impl Into<String>, columns: Vec<String>) {
        let table = table.into();
        match self.tables.iter_mut().find(|t| t.name == table) {
            Some(existing) => existing.columns = columns,
            None => self.tables.push(TableSchema {
                name: table,
                columns,
            }),
        }
    }

    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.columns.as_slice())
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.iter()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<S, C> FromIterator<(S, Vec<C>)> for Schema
where
    S: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, Vec<C>)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (table, columns) in iter {
            schema.upsert(table, columns.into_iter().map(Into::into).collect());
        }
        schema
    }
}

// Serialized as a JSON object so API clients see `{"users": ["id", "name"]}`
impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.name, &table.columns)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut schema: Schema = [("users", vec!["id", "name"]), ("orders", vec!["id"])]
            .into_iter()
            .collect();

        schema.upsert("users", vec!["id".to_string(), "email".to_string()]);

        assert_eq!(schema.table_names(), vec!["users", "orders"]);
        assert_eq!(
            schema.columns("users").unwrap(),
            &["id".to_string(), "email".to_string()]
        );
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let schema: Schema = [("zeta", vec!["a"]), ("alpha", vec!["b", "c"])]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"{"zeta":["a"],"alpha":["b","c"]}"#);
    }
}
