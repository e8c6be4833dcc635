use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub rating: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Popcorn",
    bg: Color::Rgb(33, 37, 41),
    fg: Color::Rgb(222, 226, 230),
    accent: Color::Rgb(102, 16, 242),
    muted: Color::Rgb(134, 142, 150),
    border: Color::Rgb(52, 58, 64),
    highlight_fg: Color::Rgb(248, 249, 250),
    highlight_bg: Color::Rgb(73, 80, 87),
    stripe_bg: Color::Rgb(43, 48, 53),
    status: Color::Rgb(116, 143, 252),
    error: Color::Rgb(250, 82, 82),
    rating: Color::Rgb(252, 196, 25),
    key_fg: Color::Rgb(33, 37, 41),
    key_bg: Color::Rgb(134, 142, 150),
  },
  Theme {
    name: "Mocha",
    bg: Color::Rgb(30, 30, 46),
    fg: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(203, 166, 247),
    muted: Color::Rgb(127, 132, 156),
    border: Color::Rgb(69, 71, 90),
    highlight_fg: Color::Rgb(30, 30, 46),
    highlight_bg: Color::Rgb(137, 180, 250),
    stripe_bg: Color::Rgb(36, 36, 54),
    status: Color::Rgb(148, 226, 213),
    error: Color::Rgb(243, 139, 168),
    rating: Color::Rgb(249, 226, 175),
    key_fg: Color::Rgb(30, 30, 46),
    key_bg: Color::Rgb(166, 173, 200),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 242),
    fg: Color::Rgb(51, 51, 51),
    accent: Color::Rgb(214, 93, 14),
    muted: Color::Rgb(146, 131, 116),
    border: Color::Rgb(213, 196, 161),
    highlight_fg: Color::Rgb(250, 248, 242),
    highlight_bg: Color::Rgb(214, 93, 14),
    stripe_bg: Color::Rgb(242, 238, 227),
    status: Color::Rgb(69, 133, 136),
    error: Color::Rgb(204, 36, 29),
    rating: Color::Rgb(215, 153, 33),
    key_fg: Color::Rgb(250, 248, 242),
    key_bg: Color::Rgb(146, 131, 116),
  },
];

pub fn theme_index(name: &str) -> usize {
  THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(name)).unwrap_or(0)
}
