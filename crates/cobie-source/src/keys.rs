//! Primary-key conventions and the static foreign-key join map.
//!
//! Neither is introspected from the source's own constraints. The extractor
//! that produces the intermediary database declares only a synthetic `id`
//! key, so the join map has to be kept in step with the sheet layout here.

/// Column identifying a row of `table`.
pub fn primary_key_column(table: &str) -> &'static str {
    match table {
        "Contact" => "email",
        "Facility" | "Floor" | "Space" | "Type" | "Component" | "Spare" | "Resource" => "name",
        _ => "id",
    }
}

/// `table.column` joins `referenced_table.referenced_column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, Default)]
pub struct JoinMap {
    keys: Vec<ForeignKey>,
}

impl JoinMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, table: &str, column: &str, referenced_table: &str, referenced_column: &str) -> Self {
        self.keys.push(ForeignKey {
            table: table.to_string(),
            column: column.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
        });
        self
    }

    /// Joins declared for `table`, in declaration order.
    pub fn joins_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a ForeignKey> + 'a {
        self.keys.iter().filter(move |k| k.table == table)
    }

    /// Placed elements pick up their coordinates by name.
    pub fn cobie() -> Self {
        Self::new()
            .with("Component", "name", "Coordinate", "name")
            .with("Space", "name", "Coordinate", "name")
            .with("Floor", "name", "Coordinate", "name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_convention() {
        assert_eq!(primary_key_column("Contact"), "email");
        assert_eq!(primary_key_column("Space"), "name");
        assert_eq!(primary_key_column("Resource"), "name");
        assert_eq!(primary_key_column("Zone"), "id");
        assert_eq!(primary_key_column("Anything"), "id");
    }

    #[test]
    fn test_join_map_lookup() {
        let joins = JoinMap::cobie();
        let space: Vec<_> = joins.joins_for("Space").collect();
        assert_eq!(space.len(), 1);
        assert_eq!(space[0].referenced_table, "Coordinate");
        assert_eq!(joins.joins_for("Zone").count(), 0);
    }
}
