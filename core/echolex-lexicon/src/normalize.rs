/// Reduces a surface form to a lookup key: lowercase, `[a-z]` only.
///
/// "Running!" -> "running", "Don't" -> "dont". Letters outside ASCII are
/// dropped, so the key may be empty.
pub fn normalize(surface: &str) -> String {
    surface
        .chars()
        .flat_map(char::to_lowercase)
        .filter(char::is_ascii_lowercase)
        .collect()
}
