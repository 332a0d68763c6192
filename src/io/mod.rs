pub mod input;
pub mod output;
pub mod sysex;
pub mod transport;

/// Index of the first port whose name contains `substr`.
///
/// Ports named exactly like `exclude` are skipped, unless they are the only
/// match, so a device whose input and output share one name still resolves.
pub fn find_port(names: &[String], substr: &str, exclude: Option<&str>) -> Option<usize> {
    let mut fallback = None;
    for (i, name) in names.iter().enumerate() {
        if !name.contains(substr) {
            continue;
        }
        if Some(name.as_str()) == exclude {
            fallback.get_or_insert(i);
            continue;
        }
        return Some(i);
    }
    fallback
}
