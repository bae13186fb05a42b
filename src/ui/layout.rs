use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatLayout {
    pub header: Rect,
    pub history: Rect,
    pub banner: Rect,
    pub input: Rect,
}

/// Header row, transcript, optional error banner, input box.
pub fn split_chat_layout(area: Rect, banner_rows: u16, input_rows: u16) -> ChatLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(banner_rows),
            Constraint::Length(input_rows.max(1)),
        ])
        .split(area);

    ChatLayout {
        header: chunks[0],
        history: chunks[1],
        banner: chunks[2],
        input: chunks[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_without_banner_gives_history_the_rest() {
        let area = Rect::new(0, 0, 80, 20);
        let panes = split_chat_layout(area, 0, 4);

        assert_eq!(panes.header.height, 1);
        assert_eq!(panes.history.height, 15);
        assert_eq!(panes.banner.height, 0);
        assert_eq!(panes.input.height, 4);
        assert_eq!(panes.history.y, 1);
        assert_eq!(panes.input.y, 16);
    }

    #[test]
    fn banner_sits_between_history_and_input() {
        let area = Rect::new(0, 0, 80, 12);
        let panes = split_chat_layout(area, 1, 3);

        assert_eq!(panes.history.height, 7);
        assert_eq!(panes.banner.y, 8);
        assert_eq!(panes.banner.height, 1);
        assert_eq!(panes.input.y, 9);
    }
}
