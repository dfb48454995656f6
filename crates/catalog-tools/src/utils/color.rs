/// True when `NO_COLOR` is set to a non-empty value
pub fn should_disable_color() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}

/// Turn off `colored` output for the whole process when requested
pub fn init_color() {
    if should_disable_color() {
        colored::control::set_override(false);
    }
}
