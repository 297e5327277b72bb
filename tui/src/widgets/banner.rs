use ratatui::text::Line;

/// ASCII banner shown above the landing form.
pub const STARTUP_BANNER: &str = r"
 ____            _
|  _ \  ___  ___| | __
| | | |/ _ \/ __| |/ /
| |_| |  __/ (__|   <
|____/ \___|\___|_|\_\
";

pub const TAGLINE: &str = "AI presentations from a single prompt";

pub fn banner_lines() -> Vec<Line<'static>> {
    STARTUP_BANNER
        .lines()
        .skip(1)
        .map(Line::from)
        .chain(std::iter::once(Line::from(TAGLINE)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_height() {
        // five art rows plus the tagline
        assert_eq!(banner_lines().len(), 6);
    }
}
