use gemdig_core::{Board, CellState, GemId};

fn gem_glyph(gem: GemId, hidden: bool) -> char {
    let letter = (b'A' + (gem.0 % 26) as u8) as char;
    if hidden {
        letter.to_ascii_lowercase()
    } else {
        letter
    }
}

/// Text picture of a board, one row per line.
///
/// `#` two layers of stone, `+` one layer, `.` dug and empty, `*` blown dynamite, letters for dug gem cells. With
/// `peek`, covered gems show as lowercase letters and covered dynamite as `!`.
pub fn board(board: &Board, peek: bool) -> String {
    let (width, height) = board.size();
    let mut out = String::with_capacity((usize::from(width) + 1) * usize::from(height));
    for y in 0..height {
        for x in 0..width {
            let cell = board.cell_at((x, y));
            let glyph = match cell.state() {
                CellState::Stone(_) if peek && cell.is_dynamite() => '!',
                CellState::Stone(_) if peek && cell.occupant().is_some() => {
                    cell.occupant().map_or('+', |gem| gem_glyph(gem, true))
                }
                CellState::Stone(0 | 1) => '+',
                CellState::Stone(_) => '#',
                CellState::Empty => '.',
                CellState::Exploded => '*',
                CellState::Gem(gem) => gem_glyph(gem, false),
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn renders_rows_top_to_bottom() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut board = Board::new((3, 2), &mut rng).unwrap();
        board.dig((0, 1));

        let text = super::board(&board, false);
        let rows: Vec<&str> = text.lines().collect();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.len() == 3));
        assert!(rows[0].chars().all(|glyph| matches!(glyph, '#' | '+')));
        assert!(rows[1].starts_with('.'));
    }
}
