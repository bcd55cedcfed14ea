use crate::app::rendering::write_pixel_rgba;

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
pub(crate) const TEXT_SCALE: i32 = 2;
pub(crate) const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub(crate) const LINE_ADVANCE: i32 = (GLYPH_HEIGHT + 3) * TEXT_SCALE;

/// 3x5 glyphs packed row-major into 15 bits, top row in the high bits.
/// Lowercase letters render with the uppercase shapes.
const FONT: &[(char, u16)] = &[
    ('A', 0b010_101_111_101_101),
    ('B', 0b110_101_110_101_110),
    ('C', 0b011_100_100_100_011),
    ('D', 0b110_101_101_101_110),
    ('E', 0b111_100_110_100_111),
    ('F', 0b111_100_110_100_100),
    ('G', 0b011_100_101_101_011),
    ('H', 0b101_101_111_101_101),
    ('I', 0b111_010_010_010_111),
    ('J', 0b001_001_001_101_010),
    ('K', 0b101_101_110_101_101),
    ('L', 0b100_100_100_100_111),
    ('M', 0b101_111_111_101_101),
    ('N', 0b110_101_101_101_101),
    ('O', 0b010_101_101_101_010),
    ('P', 0b110_101_110_100_100),
    ('Q', 0b010_101_101_110_011),
    ('R', 0b110_101_110_101_101),
    ('S', 0b011_100_010_001_110),
    ('T', 0b111_010_010_010_010),
    ('U', 0b101_101_101_101_111),
    ('V', 0b101_101_101_101_010),
    ('W', 0b101_101_111_111_101),
    ('X', 0b101_101_010_101_101),
    ('Y', 0b101_101_010_010_010),
    ('Z', 0b111_001_010_100_111),
    ('0', 0b111_101_101_101_111),
    ('1', 0b010_110_010_010_111),
    ('2', 0b110_001_010_100_111),
    ('3', 0b110_001_010_001_110),
    ('4', 0b101_101_111_001_001),
    ('5', 0b111_100_110_001_110),
    ('6', 0b011_100_111_101_111),
    ('7', 0b111_001_010_010_010),
    ('8', 0b111_101_111_101_111),
    ('9', 0b111_101_111_001_110),
    (' ', 0),
    ('.', 0b000_000_000_000_010),
    (',', 0b000_000_000_010_100),
    (':', 0b000_010_000_010_000),
    (';', 0b000_010_000_010_100),
    ('!', 0b010_010_010_000_010),
    ('?', 0b110_001_010_000_010),
    ('-', 0b000_000_111_000_000),
    ('+', 0b000_010_111_010_000),
    ('/', 0b001_001_010_100_100),
    ('(', 0b001_010_010_010_001),
    (')', 0b100_010_010_010_100),
    ('[', 0b011_010_010_010_011),
    (']', 0b110_010_010_010_110),
    ('\'', 0b010_010_000_000_000),
    ('"', 0b101_101_000_000_000),
    ('%', 0b101_001_010_100_101),
    ('#', 0b101_111_101_111_101),
    ('=', 0b000_111_000_111_000),
    ('>', 0b100_010_001_010_100),
    ('<', 0b001_010_100_010_001),
    ('_', 0b000_000_000_000_111),
    ('*', 0b000_101_010_101_000),
    ('|', 0b010_010_010_010_010),
];

const UNKNOWN_GLYPH: u16 = 0b111_101_101_101_111;

fn glyph_bits(ch: char) -> u16 {
    let upper = ch.to_ascii_uppercase();
    FONT.iter()
        .find(|(glyph_char, _)| *glyph_char == upper)
        .map(|(_, bits)| *bits)
        .unwrap_or(UNKNOWN_GLYPH)
}

pub(crate) fn text_width_px(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

pub(crate) fn draw_text(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    if width == 0 || height == 0 {
        return;
    }
    for ch in text.chars() {
        draw_glyph(frame, width, height, x, y, glyph_bits(ch), color);
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    bits: u16,
    color: [u8; 4],
) {
    for row in 0..GLYPH_HEIGHT {
        for col in 0..GLYPH_WIDTH {
            let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
            if bits & (1 << shift) == 0 {
                continue;
            }
            for sy in 0..TEXT_SCALE {
                for sx in 0..TEXT_SCALE {
                    let px = x + col * TEXT_SCALE + sx;
                    let py = y + row * TEXT_SCALE + sy;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        continue;
                    }
                    write_pixel_rgba(frame, width as usize, px as usize, py as usize, color);
                }
            }
        }
    }
}

/// Greedy word wrap. Words longer than `max_chars` are split hard.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if !current.is_empty() && current_len + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_uses_uppercase_shapes() {
        assert_eq!(glyph_bits('a'), glyph_bits('A'));
        assert_eq!(glyph_bits('~'), UNKNOWN_GLYPH);
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn glyph_top_left_bit_lands_on_first_pixel() {
        let mut frame = vec![0u8; 16 * 16 * 4];
        let white = [255, 255, 255, 255];
        draw_text(&mut frame, 16, 16, 0, 0, "T", white);

        assert_eq!(&frame[0..4], &white);
        // Row one of 'T' only has the center column set.
        let row_one_left = (TEXT_SCALE as usize * 16) * 4;
        assert_eq!(&frame[row_one_left..row_one_left + 4], &[0, 0, 0, 0]);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_text("walk down the corridor to the room", 12);
        assert_eq!(lines, vec!["walk down", "the corridor", "to the room"]);
    }

    #[test]
    fn wrap_splits_overlong_words_and_keeps_empty_text() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
