use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Paragraph, Widget},
};

#[derive(Default)]
pub struct Controls {
    pub row_count: Option<usize>,
    pub dimmed: bool,
    pub read_only: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_count(row_count: usize) -> Self {
        Self {
            row_count: Some(row_count),
            dimmed: false,
            read_only: false,
        }
    }

    pub fn with_dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

impl Widget for &Controls {
    fn render(self, area: Rect, buf: &mut Buffer) {
        const CONTROLS: [(&str, &str); 8] = [
            ("⏎", "Edit"),
            ("F", "Fields"),
            ("m", "Menu"),
            ("p", "Pin"),
            ("H", "Hide"),
            ("v", "View"),
            ("W", "Write"),
            ("q", "Quit"),
        ];

        let mut constraints = CONTROLS.iter().fold(vec![], |mut acc, (key, action)| {
            acc.push(Constraint::Length(key.chars().count() as u16 + 2));
            acc.push(Constraint::Length(action.chars().count() as u16 + 1));
            acc
        });

        // Add space for row count if available
        if self.row_count.is_some() {
            constraints.push(Constraint::Length(15)); // Space for "Rows: 12345"
        }
        constraints.push(Constraint::Fill(1)); // Fill the remaining space

        let layout = Layout::new(Direction::Horizontal, constraints).split(area);
        let color = Color::DarkGray;

        let base_style = if self.dimmed {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        // iterate over the controls and render them
        for (i, (key, action)) in CONTROLS.iter().enumerate() {
            let j = i * 2;
            Paragraph::new(*key)
                .style(base_style.bold())
                .centered()
                .render(layout[j], buf);
            // Dim the write hint when the table is open read-only
            let action_style = if *action == "Write" && self.read_only {
                base_style.bg(color).fg(Color::DarkGray)
            } else {
                base_style.bg(color)
            };
            Paragraph::new(*action)
                .style(action_style)
                .render(layout[j + 1], buf);
        }

        // Render row count if available
        let mut fill_start_idx = CONTROLS.len() * 2;
        if let Some(count) = self.row_count {
            let row_count_text = format!("Rows: {}", count);
            Paragraph::new(row_count_text)
                .style(base_style.bg(color).fg(if self.dimmed {
                    Color::DarkGray
                } else {
                    Color::White
                }))
                .right_aligned()
                .render(layout[fill_start_idx], buf);
            fill_start_idx += 1;
        }

        Paragraph::new("")
            .style(base_style.bg(color))
            .render(layout[fill_start_idx], buf);
    }
}
