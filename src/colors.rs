//! NO_COLOR / CLICOLOR handling for terminal output

use colored::control;

/// Decide whether colored output is on, given the relevant env values and TTY state
fn colors_enabled(
    no_color: bool,
    clicolor: Option<&str>,
    clicolor_force: Option<&str>,
    is_tty: bool,
) -> bool {
    if no_color {
        return false;
    }
    if clicolor_force.is_some_and(|v| v != "0") {
        return true;
    }
    if clicolor == Some("0") {
        return false;
    }
    is_tty
}

/// Call early in main(), before anything is printed
pub fn init_colors() {
    let clicolor = std::env::var("CLICOLOR").ok();
    let clicolor_force = std::env::var("CLICOLOR_FORCE").ok();
    let enabled = colors_enabled(
        std::env::var_os("NO_COLOR").is_some(),
        clicolor.as_deref(),
        clicolor_force.as_deref(),
        std::io::IsTerminal::is_terminal(&std::io::stdout()),
    );
    control::set_override(enabled);
}

#[cfg(test)]
mod tests {
    use super::colors_enabled;

    #[test]
    fn test_no_color_wins() {
        assert!(!colors_enabled(true, None, Some("1"), true));
    }

    #[test]
    fn test_force_overrides_tty() {
        assert!(colors_enabled(false, Some("0"), Some("1"), false));
        assert!(!colors_enabled(false, None, Some("0"), false));
    }

    #[test]
    fn test_clicolor_zero_disables() {
        assert!(!colors_enabled(false, Some("0"), None, true));
        assert!(colors_enabled(false, Some("1"), None, true));
    }
}
