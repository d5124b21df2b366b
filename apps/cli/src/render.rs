//! Plain-text rendering of the match and result screens.

use minesduel_board::{Board, Symbol};
use minesduel_sync::{MatchResult, MultiplayerData, Outcome, Role, format_time};

const GUTTER: &str = "    ";

fn glyph(symbol: Symbol) -> char {
    match symbol {
        Symbol::Covered => '#',
        Symbol::Flagged => 'F',
        Symbol::Mine => '*',
        Symbol::Number(0) => '.',
        Symbol::Number(n) => char::from(b'0' + n.min(8)),
    }
}

fn column_header(width: usize) -> String {
    let cols: Vec<String> = (0..width).map(|x| (x % 10).to_string()).collect();
    format!("   {}", cols.join(" "))
}

fn board_rows(board: &Board) -> Vec<String> {
    board
        .snapshot()
        .chunks(board.width())
        .enumerate()
        .map(|(y, row)| {
            let cells: Vec<String> = row.iter().map(|s| glyph(*s).to_string()).collect();
            format!("{y:>2} {}", cells.join(" "))
        })
        .collect()
}

/// Both boards side by side, the local one on the left.
pub fn render_match(data: &MultiplayerData, role: Role, time_played: u32) -> String {
    let me = data.player(role);
    let them = data.player(role.opponent());
    let settings = data.settings();
    let mine_title = format!(
        "you ({role})  {}  flags {}",
        format_time(time_played),
        me.board.flags_left()
    );
    let their_title = format!("opponent  {}  flags {}", format_time(them.time), them.flag);
    let header = column_header(settings.board_width);
    let column = (3 + settings.board_width * 2).max(mine_title.len());

    let mut lines = Vec::with_capacity(settings.board_height + 3);
    lines.push(format!("game {}: {}", settings.session_id, data.state()));
    lines.push(format!("{mine_title:<column$}{GUTTER}{their_title}"));
    lines.push(format!("{header:<column$}{GUTTER}{header}"));
    for (mine, theirs) in board_rows(&me.board).into_iter().zip(board_rows(&them.board)) {
        lines.push(format!("{mine:<column$}{GUTTER}{theirs}"));
    }
    lines.join("\n")
}

pub fn render_result(result: &MatchResult) -> String {
    let verdict = match result.outcome {
        Outcome::Won => "You won",
        Outcome::Lost => "You lost",
    };
    format!(
        "{verdict}: {}\ntime {}  flags left {}/{}  rank {}",
        result.reason,
        format_time(result.time_played),
        result.flags_left,
        result.total_flags,
        result.rank()
    )
}
