use std::collections::HashMap;

/// Lock files are huge and not a programming language.
const IGNORED_DEFAULT_EXTENSIONS: &[&str] = &[".lock"];

pub const DEFAULT_COLUMN_COUNT: usize = 3;

/// Extensions with their line totals, most lines first. Ties are broken by
/// extension name so the order is stable between runs.
pub fn ranked_extensions(ext_to_lines: &HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = ext_to_lines
        .iter()
        .map(|(ext, lines)| (ext.clone(), *lines))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Up to three of the most popular extensions, skipping ones that are
/// unlikely to be of interest.
pub fn top_default_columns(ranked: &[(String, u64)]) -> Vec<String> {
    ranked
        .iter()
        .map(|(ext, _)| ext)
        .filter(|ext| !IGNORED_DEFAULT_EXTENSIONS.contains(&ext.as_str()))
        .take(DEFAULT_COLUMN_COUNT)
        .cloned()
        .collect()
}
