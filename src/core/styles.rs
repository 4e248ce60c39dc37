//! Named colour roles for console output
//!
//! The summary table, failure list and `--help` all pick colours by role so
//! the palette lives in one place. Colour is applied only when the caller
//! passes `enabled`, there is no global switch.

use clap::builder::styling::AnsiColor;
use colored::Color;

macro_rules! style {
    ( $( $variant:ident => $color:expr ),+ $(,)? ) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub enum StyleRole { $( $variant ),+ }

        impl StyleRole {
            pub fn color(self) -> Option<Color> {
                match self { $( StyleRole::$variant => $color ),+ }
            }
        }
    }
}

style! {
    Header   => Some(Color::Yellow),
    Label    => Some(Color::BrightGreen),
    Count    => Some(Color::Cyan),
    Global   => Some(Color::Blue),
    Success  => Some(Color::Green),
    Failure  => Some(Color::BrightRed),
    Dim      => Some(Color::BrightBlack),
    Value    => None,
}

// (ansi fg code, prettytable spec letter, clap colour)
fn color_codes(c: Color) -> Option<(u8, char, AnsiColor)> {
    use Color::*;
    Some(match c {
        Black => (30, 'k', AnsiColor::Black),
        Red => (31, 'r', AnsiColor::Red),
        Green => (32, 'g', AnsiColor::Green),
        Yellow => (33, 'y', AnsiColor::Yellow),
        Blue => (34, 'b', AnsiColor::Blue),
        Magenta => (35, 'm', AnsiColor::Magenta),
        Cyan => (36, 'c', AnsiColor::Cyan),
        White => (37, 'w', AnsiColor::White),
        BrightBlack => (90, 'K', AnsiColor::BrightBlack),
        BrightRed => (91, 'R', AnsiColor::BrightRed),
        BrightGreen => (92, 'G', AnsiColor::BrightGreen),
        BrightYellow => (93, 'Y', AnsiColor::BrightYellow),
        BrightBlue => (94, 'B', AnsiColor::BrightBlue),
        BrightMagenta => (95, 'M', AnsiColor::BrightMagenta),
        BrightCyan => (96, 'C', AnsiColor::BrightCyan),
        BrightWhite => (97, 'W', AnsiColor::BrightWhite),
        _ => return None,
    })
}

impl StyleRole {
    pub fn paint(self, text: &str, enabled: bool) -> String {
        match self.color().and_then(color_codes) {
            Some((code, _, _)) if enabled => format!("\x1b[{}m{}\x1b[0m", code, text),
            _ => text.to_string(),
        }
    }

    /// Foreground style spec for a prettytable cell, e.g. `Fy`
    pub fn to_prettytable_spec(self, enabled: bool) -> String {
        match self.color().and_then(color_codes) {
            Some((_, letter, _)) if enabled => format!("F{}", letter),
            _ => String::new(),
        }
    }
}

/// clap help styles built from the same roles
pub fn palette_to_clap(enabled: bool) -> clap::builder::Styles {
    use clap::builder::styling::{Color as ClapColor, Style};
    if !enabled {
        return clap::builder::Styles::plain();
    }

    let style = |role: StyleRole, bold: bool| {
        let mut s = Style::new();
        if let Some((_, _, ansi)) = role.color().and_then(color_codes) {
            s = s.fg_color(Some(ClapColor::Ansi(ansi)));
        }
        if bold {
            s = s.bold();
        }
        s
    };

    clap::builder::Styles::styled()
        .header(style(StyleRole::Header, true))
        .usage(style(StyleRole::Header, true))
        .literal(style(StyleRole::Count, false))
        .placeholder(style(StyleRole::Label, false))
        .valid(style(StyleRole::Success, false))
        .invalid(style(StyleRole::Failure, false))
        .error(style(StyleRole::Failure, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_respects_enabled_flag() {
        assert_eq!(StyleRole::Header.paint("Inventory", false), "Inventory");
        assert_eq!(
            StyleRole::Header.paint("Inventory", true),
            "\x1b[33mInventory\x1b[0m"
        );
    }

    #[test]
    fn test_uncoloured_role_is_plain() {
        assert_eq!(StyleRole::Value.paint("42", true), "42");
        assert_eq!(StyleRole::Value.to_prettytable_spec(true), "");
    }

    #[test]
    fn test_prettytable_spec() {
        assert_eq!(StyleRole::Failure.to_prettytable_spec(true), "FR");
        assert_eq!(StyleRole::Count.to_prettytable_spec(true), "Fc");
        assert_eq!(StyleRole::Count.to_prettytable_spec(false), "");
    }

    #[test]
    fn test_palette_to_clap_differs_when_enabled() {
        let plain = format!("{:?}", palette_to_clap(false));
        let styled = format!("{:?}", palette_to_clap(true));
        assert_ne!(plain, styled);
    }
}
