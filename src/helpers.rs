use ratatui::layout::Rect;

pub fn centered_rect(width: u16, height: u16, cols: u16, rows: u16) -> Rect {
    let width = width.min(cols);
    let height = height.min(rows);
    Rect::new((cols - width) / 2, (rows - height) / 2, width, height)
}

pub fn centered_rect_with_percentage(percent_x: u16, percent_y: u16, cols: u16, rows: u16) -> Rect {
    let width = (cols * percent_x / 100).min(cols);
    let height = (rows * percent_y / 100).max(5).min(rows);
    Rect::new((cols - width) / 2, (rows - height) / 2, width, height)
}
