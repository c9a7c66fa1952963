use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress bar for a download, drawn on stderr. Without a known length it degrades to a
/// byte counter.
pub fn new_progress_bar(bar_length: Option<u64>) -> ProgressBar {
    let template = match bar_length {
        Some(_) => "{percent:>3}%[{bar:60.cyan/blue}] {bytes:>8}/{total_bytes} {bytes_per_sec} {wide_msg}"
            .to_string(),
        None => format!(
            "    [{}] {{bytes:>8}} {{bytes_per_sec}} {{wide_msg}}",
            style("-".repeat(60)).for_stderr().blue()
        ),
    };
    let bar_style = match bar_length {
        Some(_) => ProgressStyle::default_bar(),
        None => ProgressStyle::default_spinner(),
    }
    .template(&template)
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#|-");

    let bar = match bar_length {
        Some(length) => ProgressBar::new(length),
        None => ProgressBar::no_length(),
    };
    bar.set_draw_target(ProgressDrawTarget::stderr());
    bar.with_style(bar_style)
}
