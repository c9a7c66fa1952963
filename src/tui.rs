use owo_colors::AnsiColors;

/// Color used whenever a JDK version or distribution is shown to the user.
pub fn jdk_color() -> AnsiColors {
    AnsiColors::Green
}
