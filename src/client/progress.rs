//! Progress bar styling
// (c) 2026 Ferry contributors

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Maximum update frequency we will use for the progress display
pub(crate) const MAX_UPDATE_FPS: u8 = 20;

/// Single-line style, used when the filename fits.
///
/// ```text
/// 11111111111111111111111111111111111111111111111111111111111111111111111111111111
/// report.pdf [==========================            ] 2m30s @ 123.4kB/s [70%/1.24MB]
/// 11111111111111111111111111111111111111111111111111111111111111111111111111111111
/// ```
const STYLE_ONE_LINE: &str =
    "{msg:.dim} {wide_bar:.cyan} {eta} @ {decimal_bytes_per_sec} [{percent}%/{decimal_total_bytes:.dim}]";

/// Room needed for everything except the filename
const READOUT_WIDTH: usize = 60;

/// Two-line style, used when the filename is too long to share a line with the bar.
const STYLE_TWO_LINE: &str = "{wide_msg:.dim} [{percent}%/{decimal_total_bytes:.dim}]\n{wide_bar:.cyan} {eta} @ {decimal_bytes_per_sec}";

/// Determine and retrieve the appropriate progress style to use
pub(crate) fn style_for(msg_size: usize) -> &'static str {
    let term_width = usize::from(console::Term::stderr().size().1);
    if msg_size + READOUT_WIDTH > term_width {
        STYLE_TWO_LINE
    } else {
        STYLE_ONE_LINE
    }
}

/// Creates and registers a bar for one file. The length is unknown until the size has been negotiated.
pub(crate) fn file_bar(display: &MultiProgress, name: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template(style_for(name.len()))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    display.add(
        ProgressBar::no_length()
            .with_style(style)
            .with_message(name.to_owned()),
    )
}
