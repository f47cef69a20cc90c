use crate::schema::CanopyConfig;

/// Surface names travel in routing envelopes and area keys, so they must not
/// contain the `:` area separator or whitespace.
pub(crate) fn validate_surface(errors: &mut Vec<String>, config: &CanopyConfig) {
    let Some(name) = &config.surface.name else {
        return;
    };
    if name.is_empty() {
        errors.push("surface.name must not be empty when set".into());
        return;
    }
    if name.contains(':') || name.chars().any(char::is_whitespace) {
        errors.push(format!(
            "surface.name = {name:?} must not contain ':' or whitespace"
        ));
    }
}
