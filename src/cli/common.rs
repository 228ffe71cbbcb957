use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MigrationEntry {
    pub branch: String,
    pub destination: String,
}

/// `migrations` accepts either a list of entries or a `branch: destination`
/// mapping. Both keep file order.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Migrations {
    List(Vec<MigrationEntry>),
    Map(serde_yaml::Mapping),
}
