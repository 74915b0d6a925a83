/// Extension of the final path segment, starting at its last `.`.
///
/// `src/main.rs` gives `.rs`, `.gitignore` gives `.gitignore` and `Makefile`
/// gives `None`. Non UTF-8 extensions are treated as absent.
pub fn extension_for_raw_name(raw_name: &[u8]) -> Option<&str> {
    let file_name = match raw_name.iter().rposition(|&b| b == b'/') {
        Some(slash_index) => &raw_name[slash_index + 1..],
        None => raw_name,
    };
    let dot_index = file_name.iter().rposition(|&b| b == b'.')?;
    std::str::from_utf8(&file_name[dot_index..]).ok()
}

/// `current/total` with `current` right aligned to the width of `total`.
pub fn padded_progress(current: usize, total: usize) -> String {
    let pad = total.to_string().len();
    format!("{current:>pad$}/{total}")
}
