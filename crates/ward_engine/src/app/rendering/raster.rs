pub(crate) fn write_pixel_rgba(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
    let Some(byte_offset) = y
        .checked_mul(width)
        .and_then(|row| row.checked_add(x))
        .and_then(|pixel| pixel.checked_mul(4))
    else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }

    frame[byte_offset..end].copy_from_slice(&color);
}

fn plot(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    write_pixel_rgba(frame, width as usize, x as usize, y as usize, color);
}

pub(crate) fn clear(frame: &mut [u8], color: [u8; 4]) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel.copy_from_slice(&color);
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel_rgba(frame, width as usize, px as usize, py as usize, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn rect_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    if rect_width <= 1 || rect_height <= 1 {
        return;
    }
    let right = x + rect_width - 1;
    let bottom = y + rect_height - 1;
    fill_rect(frame, width, height, x, y, rect_width, 1, color);
    fill_rect(frame, width, height, x, bottom, rect_width, 1, color);
    fill_rect(frame, width, height, x, y, 1, rect_height, color);
    fill_rect(frame, width, height, right, y, 1, rect_height, color);
}

pub(crate) fn draw_line(
    frame: &mut [u8],
    width: u32,
    height: u32,
    from: (i32, i32),
    to: (i32, i32),
    color: [u8; 4],
) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let step_x = if x < to.0 { 1 } else { -1 };
    let step_y = if y < to.1 { 1 } else { -1 };
    let mut error = dx + dy;

    loop {
        plot(frame, width, height, x, y, color);
        if x == to.0 && y == to.1 {
            break;
        }
        let doubled = error * 2;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }
}

pub(crate) fn circle_outline(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center: (i32, i32),
    radius: i32,
    color: [u8; 4],
) {
    if radius <= 0 {
        plot(frame, width, height, center.0, center.1, color);
        return;
    }

    let (cx, cy) = center;
    let mut x = radius;
    let mut y = 0;
    let mut decision = 1 - radius;
    while x >= y {
        for (ox, oy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            plot(frame, width, height, cx + ox, cy + oy, color);
        }
        y += 1;
        if decision <= 0 {
            decision += 2 * y + 1;
        } else {
            x -= 1;
            decision += 2 * (y - x) + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        fill_rect(&mut frame, 4, 4, -10, -10, 5, 5, RED);
        write_pixel_rgba(&mut frame, 4, 10, 10, RED);
        assert!(frame.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn line_reaches_both_endpoints() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        draw_line(&mut frame, 8, 8, (1, 1), (6, 4), RED);
        assert_eq!(pixel(&frame, 8, 1, 1), RED);
        assert_eq!(pixel(&frame, 8, 6, 4), RED);
    }

    #[test]
    fn circle_touches_cardinal_points() {
        let mut frame = vec![0u8; 16 * 16 * 4];
        circle_outline(&mut frame, 16, 16, (8, 8), 5, RED);
        assert_eq!(pixel(&frame, 16, 13, 8), RED);
        assert_eq!(pixel(&frame, 16, 3, 8), RED);
        assert_eq!(pixel(&frame, 16, 8, 3), RED);
        assert_eq!(pixel(&frame, 16, 8, 8), [0, 0, 0, 0]);
    }

    #[test]
    fn rect_outline_leaves_interior_untouched() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        rect_outline(&mut frame, 8, 8, 1, 1, 5, 5, RED);
        assert_eq!(pixel(&frame, 8, 1, 1), RED);
        assert_eq!(pixel(&frame, 8, 5, 5), RED);
        assert_eq!(pixel(&frame, 8, 3, 3), [0, 0, 0, 0]);
    }
}
