use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::omdb::MovieSource;
use crate::selection::MAX_RATING;
use crate::store::KeyValueStore;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Averages are shown with two decimals, like the summary always has.
fn fmt_avg(value: f64) -> String {
  format!("{:.2}", value)
}

fn pane_block<'a>(title: String, theme: &Theme, focused: bool) -> Block<'a> {
  let color = if focused { theme.accent } else { theme.border };
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(if focused { theme.accent } else { theme.muted }).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(color))
}

fn label_line<'a>(theme: &Theme, label: &'a str, value: String) -> Line<'a> {
  Line::from(vec![
    Span::styled(label, Style::default().fg(theme.muted)),
    Span::styled(value, Style::default().fg(theme.fg)),
  ])
}

// --- UI Rendering ---

pub fn ui<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &mut App<S, K>) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &App<S, K>, area: Rect) {
  let theme = app.theme();
  let left = Line::from(vec![
    Span::styled(" 🍿 ", Style::default().fg(theme.accent)),
    Span::styled(app.title.current(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
  ]);
  frame.render_widget(left, area);

  let found = format!("Found {} results  v{} ", app.search.results().len(), env!("CARGO_PKG_VERSION"));
  let width = found.chars().count() as u16;
  let right = Line::from(Span::styled(found, Style::default().fg(theme.muted)));
  let right_area = Rect { x: area.x + area.width.saturating_sub(width), width: width.min(area.width), ..area };
  frame.render_widget(right, right_area);
}

fn render_main<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &mut App<S, K>, area: Rect) {
  let constraint = |open: bool| if open { Constraint::Fill(1) } else { Constraint::Length(5) };
  let [left, right] =
    Layout::horizontal([constraint(app.panes.results_open), constraint(app.panes.side_open)]).areas(area);

  if app.panes.results_open {
    render_results(frame, app, left);
  } else {
    render_collapsed(frame, app.theme(), left, app.mode == AppMode::Results);
  }

  if !app.panes.side_open {
    let focused = matches!(app.mode, AppMode::Detail | AppMode::Watched);
    render_collapsed(frame, app.theme(), right, focused);
  } else if app.selection.is_open() {
    render_detail(frame, app, right);
  } else {
    render_watched(frame, app, right);
  }
}

fn render_collapsed(frame: &mut Frame, theme: &Theme, area: Rect, focused: bool) {
  frame.render_widget(pane_block(" + ".to_string(), theme, focused), area);
}

fn render_results<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &mut App<S, K>, area: Rect) {
  let theme = app.theme();
  let block = pane_block(" Results [–] ".to_string(), theme, app.mode == AppMode::Results);

  if app.search.is_loading() {
    let p = Paragraph::new("Loading...").style(Style::default().fg(theme.status)).alignment(Alignment::Center);
    frame.render_widget(p.block(block), area);
    return;
  }
  if let Some(err) = app.search.error() {
    let p = Paragraph::new(format!("⛔ {}", err)).style(Style::default().fg(theme.error)).alignment(Alignment::Center);
    frame.render_widget(p.block(block), area);
    return;
  }
  if app.search.results().is_empty() {
    let hint = Paragraph::new(vec![
      Line::from(""),
      Line::from(Span::styled("Search movies above.", Style::default().fg(theme.muted))),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(hint.block(block), area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let open_id = app.selection.selected_id();

  let items: Vec<ListItem> = app
    .search
    .results()
    .iter()
    .enumerate()
    .map(|(i, movie)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let marker = if open_id == Some(movie.id.as_str()) { "● " } else { "" };
      let right = format!("🗓 {}", movie.year);
      let right_w = right.chars().count();
      let title_max = inner_w.saturating_sub(right_w + 2 + marker.chars().count());
      let title = truncate_str(&movie.title, title_max);
      let gap = inner_w.saturating_sub(title.chars().count() + right_w + marker.chars().count());

      let line = Line::from(vec![
        Span::styled(marker, Style::default().fg(theme.accent)),
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_detail<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &App<S, K>, area: Rect) {
  let theme = app.theme();
  let block = pane_block(" Details [–] ".to_string(), theme, app.mode == AppMode::Detail).padding(Padding::horizontal(1));

  if let Some(err) = app.selection.error() {
    let p = Paragraph::new(format!("⛔ {}", err)).style(Style::default().fg(theme.error)).alignment(Alignment::Center);
    frame.render_widget(p.block(block), area);
    return;
  }
  let Some(detail) = app.selection.detail() else {
    let p = Paragraph::new("Loading...").style(Style::default().fg(theme.status)).alignment(Alignment::Center);
    frame.render_widget(p.block(block), area);
    return;
  };

  let inner_w = area.width.saturating_sub(4) as usize;
  let mut lines = vec![
    Line::from(Span::styled(
      truncate_str(&detail.title, inner_w),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled(
      format!("{} • {} min", detail.release_date, detail.runtime_minutes),
      Style::default().fg(theme.muted),
    )),
    Line::from(Span::styled(detail.genre.clone(), Style::default().fg(theme.muted))),
    Line::from(vec![
      Span::styled("⭐ ", Style::default().fg(theme.rating)),
      Span::styled(format!("{} IMDb rating", detail.imdb_rating), Style::default().fg(theme.fg)),
    ]),
    Line::from(""),
  ];

  match app.selection.existing_rating(&app.watched) {
    Some(rating) => {
      lines.push(Line::from(Span::styled(
        format!("You rated this movie {} ⭐", rating),
        Style::default().fg(theme.rating),
      )));
    }
    None => {
      let draft = app.selection.draft();
      let filled = draft.rating.unwrap_or(0) as usize;
      let stars = format!("{}{}", "★".repeat(filled), "☆".repeat(MAX_RATING as usize - filled));
      let mut spans = vec![Span::styled(stars, Style::default().fg(theme.rating))];
      if let Some(rating) = draft.rating {
        spans.push(Span::styled(format!("  {}", rating), Style::default().fg(theme.fg)));
      }
      lines.push(Line::from(spans));
      if draft.rating.is_some() {
        lines.push(Line::from(vec![
          Span::styled(" a ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
          Span::styled(" + Add to list", Style::default().fg(theme.accent)),
        ]));
      }
    }
  }

  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(detail.plot.clone(), Style::default().fg(theme.fg).italic())));
  lines.push(Line::from(""));
  lines.push(label_line(theme, "Starring  ", detail.actors.clone()));
  lines.push(label_line(theme, "Directed  ", detail.director.clone()));
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    truncate_str(&detail.poster_url, inner_w),
    Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
  )));

  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }).block(block), area);
}

fn render_watched<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &mut App<S, K>, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Watched;
  let [summary_area, list_area] = Layout::vertical([Constraint::Length(4), Constraint::Min(3)]).areas(area);

  let summary = app.watched.summary();
  let summary_lines = vec![
    Line::from(Span::styled("Movies you watched", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
    Line::from(vec![
      Span::styled(format!("#️⃣ {} movies   ", summary.count), Style::default().fg(theme.fg)),
      Span::styled(format!("⭐ {}   ", fmt_avg(summary.avg_imdb_rating)), Style::default().fg(theme.rating)),
      Span::styled(format!("🌟 {}   ", fmt_avg(summary.avg_user_rating)), Style::default().fg(theme.rating)),
      Span::styled(format!("⏳ {} min", fmt_avg(summary.avg_runtime_minutes)), Style::default().fg(theme.fg)),
    ]),
  ];
  let summary_block = pane_block(" Watched [–] ".to_string(), theme, focused).padding(Padding::horizontal(1));
  frame.render_widget(Paragraph::new(summary_lines).block(summary_block), summary_area);

  let inner_w = list_area.width.saturating_sub(4) as usize;
  let items: Vec<ListItem> = app
    .watched
    .iter()
    .enumerate()
    .map(|(i, movie)| {
      let bg = if i % 2 == 1 { theme.stripe_bg } else { theme.bg };
      let right = format!("⭐ {}  🌟 {}  ⏳ {} min", movie.imdb_rating, movie.user_rating, movie.runtime_minutes);
      let right_w = right.chars().count();
      let title = truncate_str(&movie.title, inner_w.saturating_sub(right_w + 2));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);
      ListItem::new(Line::from(vec![
        Span::styled(title, Style::default().fg(theme.fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.muted)),
      ]))
      .bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(pane_block(String::new(), theme, focused))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));
  frame.render_stateful_widget(list, list_area, &mut app.watched_state);
}

fn render_status<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &App<S, K>, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.search.is_loading() {
    (format!(" ⏳ Searching '{}'…", app.search.query().trim()), Style::default().fg(theme.status))
  } else if app.selection.is_loading() {
    (" ⏳ Loading details…".to_string(), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &mut App<S, K>, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Input { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search movies... ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Input {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys<S: MovieSource, K: KeyValueStore>(app: &App<S, K>) -> Vec<(&'static str, &'static str)> {
  let detail_open = app.selection.is_open();
  let mut keys = match app.mode {
    AppMode::Input => {
      let mut k = vec![("Tab", "Focus")];
      if !app.search.results().is_empty() {
        k.push(("↓", "Results"));
      }
      k.push(("Esc", if app.input.is_empty() { "Quit" } else { "Clear" }));
      k
    }
    AppMode::Results => vec![("Space", "Open"), ("j/k", "Navigate"), ("Enter", "Search"), ("Tab", "Focus")],
    AppMode::Detail => {
      let mut k = vec![];
      if !app.selection.is_watched(&app.watched) {
        k.push(("1-0", "Rate"));
        k.push(("←/→", "Adjust"));
        if app.selection.draft().rating.is_some() {
          k.push(("a", "Add"));
        }
      }
      k.push(("Enter", "Search"));
      k
    }
    AppMode::Watched => vec![("j/k", "Navigate"), ("d", "Delete"), ("Enter", "Search"), ("Tab", "Focus")],
  };
  if detail_open {
    keys.push(("Esc", "Close"));
  }
  keys.push(("^t", "Theme"));
  keys
}

fn render_footer<S: MovieSource, K: KeyValueStore>(frame: &mut Frame, app: &App<S, K>, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
