use indicatif::{ProgressBar, ProgressStyle};

/// A progress bar of **len** steps drawn with **template**, falling back to the default bar if
/// the template can't be parsed.
pub(crate) fn styled_progress_bar(len: u64, template: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let progress_bar = ProgressBar::new(len);
    progress_bar.set_style(style);

    progress_bar
}
