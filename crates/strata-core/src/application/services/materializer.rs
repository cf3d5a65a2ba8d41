//! Turn the merge and binary tables into final file content.

use tracing::debug;

use crate::domain::{
    BinaryTable, FileContent, FileTable, GeneratorResult, MergeTable,
    entities::merge_block::{has_open_conflicts, render_text},
};

/// Render every file. Binary content wins if a path is somehow in both.
pub fn materialize(merge_table: &MergeTable, binary_table: &BinaryTable) -> GeneratorResult {
    let mut files = FileTable::new();
    let mut conflicts = Vec::new();

    for (path, blocks) in merge_table.iter() {
        if has_open_conflicts(blocks) {
            conflicts.push(path.to_string());
        }
        files.insert(path.to_string(), FileContent::Text(render_text(blocks)));
    }
    for (path, bytes) in binary_table {
        files.insert(path.clone(), FileContent::Binary(bytes.clone()));
    }

    debug!(files = files.len(), conflicts = conflicts.len(), "Materialized");
    GeneratorResult { files, conflicts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MergeBlock;

    #[test]
    fn renders_text_and_binary_and_lists_conflicts() {
        let mut merge = MergeTable::new();
        merge.insert_text("z.txt", "plain\n");
        merge.insert(
            "a.json",
            vec![MergeBlock::conflict(vec!["1".into()], vec!["2".into()])],
        );
        let binary = BinaryTable::from([("logo.png".to_string(), vec![0u8, 9])]);

        let result = materialize(&merge, &binary);

        assert_eq!(result.text("z.txt"), Some("plain\n"));
        assert_eq!(
            result.files["logo.png"],
            FileContent::Binary(vec![0, 9])
        );
        assert_eq!(result.conflicts, vec!["a.json"]);
        assert!(result.text("a.json").unwrap().contains("======="));
        assert_eq!(
            result.files.keys().collect::<Vec<_>>(),
            vec!["a.json", "logo.png", "z.txt"]
        );
    }
}
