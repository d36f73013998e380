//! Config command implementation

use crate::config_loader::{config_file, load_config};
use crate::output::OutputWriter;
use crate::output_types::ConfigRow;
use anyhow::Result;
use std::path::Path;

pub fn execute(config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path)?;

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow {
            key,
            value,
            source_label: format!("{:?}", source),
            source,
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if !output.is_json() {
        output.section("Configuration");
        match config_file(config_path) {
            Some(path) => output.kv("File", path.display()),
            None => output.kv("File", "(none)"),
        }
    }
    output.table(rows)
}
