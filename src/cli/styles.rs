// (c) 2026 Ferry contributors
//! Terminal output styling
//!
//! The accessor functions here return an active style only when colours are enabled.

use anstream::ColorChoice;
#[allow(clippy::enum_glob_use)]
use anstyle::AnsiColor::*;
use anstyle::Color::Ansi;
use clap::builder::styling::Styles;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::IsTerminal;

const _ERROR: anstyle::Style = anstyle::Style::new().bold().fg_color(Some(Ansi(Red)));
const _WARNING: anstyle::Style = anstyle::Style::new().bold().fg_color(Some(Ansi(Yellow)));
const _INFO: anstyle::Style = anstyle::Style::new().fg_color(Some(Ansi(Cyan)));
const _HEADER: anstyle::Style = anstyle::Style::new()
    .underline()
    .fg_color(Some(Ansi(Yellow)));

/// Resets styling to default. This is a re-export of [`anstyle::Reset`].
pub use anstyle::Reset as RESET;

pub(crate) const CLAP_STYLES: Styles = Styles::styled()
    .usage(_HEADER)
    .header(_HEADER)
    .literal(anstyle::Style::new().bold())
    .invalid(_WARNING)
    .error(_ERROR)
    .valid(_INFO.bold().underline())
    .placeholder(_INFO);

macro_rules! wrap {
    ($func:ident, $def:ident) => {
        #[must_use]
        /// Conditional styling accessor for
        #[doc = stringify!($func)]
        /// messages
        pub fn $func() -> anstyle::Style {
            if use_colours() {
                $def
            } else {
                anstyle::Style::new()
            }
        }
    };
}

wrap!(error, _ERROR);
wrap!(info, _INFO);

/// Are we configured to use terminal colours?
#[must_use]
pub fn use_colours() -> bool {
    console::colors_enabled()
}

/// The available terminal colour modes
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ColourMode {
    /// Forces colours on
    #[value(alias = "on", alias = "yes")]
    #[serde(alias = "on", alias = "yes")]
    Always,
    /// Forces colours off
    #[value(alias = "off", alias = "no", alias = "none")]
    #[serde(alias = "off", alias = "no", alias = "none")]
    Never,
    /// Use colours only when writing to a terminal, honouring `NO_COLOR` and `CLICOLOR_FORCE`
    #[default]
    Auto,
}

/// Reads the quasi-standard colour environment variables.
///
/// See <https://bixense.com/clicolors/>.
fn autodetect_colour() -> bool {
    let no_color = std::env::var("NO_COLOR").unwrap_or_default();
    let clicolor_force = std::env::var("CLICOLOR_FORCE").unwrap_or_default();
    if !no_color.is_empty() {
        false
    } else if !clicolor_force.is_empty() {
        true
    } else {
        std::io::stderr().is_terminal()
    }
}

/// Sets up the terminal colour mode for this process
pub fn configure_colours(mode: ColourMode) {
    let state = match mode {
        ColourMode::Always => true,
        ColourMode::Never => false,
        ColourMode::Auto => autodetect_colour(),
    };
    console::set_colors_enabled(state);
    console::set_colors_enabled_stderr(state);
    if state {
        ColorChoice::Always
    } else {
        ColorChoice::Never
    }
    .write_global();
}

pub(crate) fn maybe_strip_color(s: &str) -> Cow<'_, str> {
    if use_colours() {
        s.into()
    } else {
        console::strip_ansi_codes(s)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use rusty_fork::rusty_fork_test;

    use super::{configure_colours, error, maybe_strip_color, use_colours, ColourMode};

    rusty_fork_test! {
        #[test]
        fn forced_on() {
            configure_colours(ColourMode::Always);
            assert!(use_colours());
            assert_ne!(error(), anstyle::Style::new());
        }

        #[test]
        fn forced_off() {
            configure_colours(ColourMode::Never);
            assert!(!use_colours());
            assert_eq!(error(), anstyle::Style::new());
            let styled = format!("{}oops{}", super::_ERROR, super::RESET);
            assert_eq!(maybe_strip_color(&styled), "oops");
        }
    }
}
