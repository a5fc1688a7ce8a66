use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{Clear, ClearType},
};

use lap_core::{format_ms_cs, Registry};

const FOOTER_HINTS: &str =
    "space=start/pause  l=lap  a=add  d=delete  r=reset  up/down=select  ?=help  q=quit";

fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    queue!(w, Clear(ClearType::All), MoveTo(0, 0))?;
    Ok(())
}

fn print_at(w: &mut impl Write, x: u16, y: u16, text: &str) -> io::Result<()> {
    queue!(w, MoveTo(x, y), Print(text))?;
    Ok(())
}

fn print_bold_at(w: &mut impl Write, x: u16, y: u16, text: &str) -> io::Result<()> {
    queue!(
        w,
        MoveTo(x, y),
        SetAttribute(Attribute::Bold),
        Print(text),
        SetAttribute(Attribute::Reset)
    )?;
    Ok(())
}

/// First list index to show so the cursor stays inside a window of
/// `visible` rows.
fn window_start(cursor: usize, len: usize, visible: usize) -> usize {
    if visible == 0 || len <= visible {
        return 0;
    }
    let start = cursor.saturating_sub(visible - 1);
    start.min(len - visible)
}

pub fn draw_board(
    w: &mut impl Write,
    (cols, rows): (u16, u16),
    elapsed_ms: u64,
    running: bool,
    registry: &Registry,
    cursor: usize,
    notice: Option<&str>,
) -> io::Result<()> {
    clear_screen(w)?;

    print_bold_at(w, 2, 0, "LAPBOARD")?;
    let tag = if running { "[RUNNING]" } else { "[STOPPED]" };
    let tag_x = cols.saturating_sub(tag.len() as u16 + 2);
    print_at(w, tag_x, 0, tag)?;

    print_bold_at(w, 6, 2, &format_ms_cs(elapsed_ms))?;

    // Split the rows between the roster and the selected runner's laps
    let list_top: u16 = 4;
    let footer_rows: u16 = 2;
    let body_rows = rows.saturating_sub(list_top + footer_rows) as usize;
    let runner_rows = (body_rows / 2).max(1);

    print_at(w, 2, list_top, "Runners:")?;
    if registry.is_empty() {
        print_at(w, 4, list_top + 1, "(none - press 'a' to add)")?;
    }
    let runners = registry.runners();
    let start = window_start(cursor, runners.len(), runner_rows);
    for (row, runner) in runners.iter().enumerate().skip(start).take(runner_rows) {
        let marker = if row == cursor { "> " } else { "  " };
        let line = format!(
            "{}{:<16} laps: {:<3} total: {}",
            marker,
            runner.name(),
            runner.laps().len(),
            format_ms_cs(runner.total_ms()),
        );
        let y = list_top + 1 + (row - start) as u16;
        print_at(w, 2, y, &line)?;
    }

    // Lap details for the selected runner, most recent at the bottom
    if let Some(selected) = runners.get(cursor) {
        let laps_top = list_top + 2 + runners.len().min(runner_rows).max(1) as u16;
        print_at(w, 2, laps_top, &format!("Laps - {}:", selected.name()))?;
        let lap_rows = body_rows.saturating_sub(runner_rows + 2);
        let laps = selected.laps();
        if laps.is_empty() {
            print_at(w, 4, laps_top + 1, "(no laps yet)")?;
        }
        let skip = laps.len().saturating_sub(lap_rows);
        for (i, lap) in laps.iter().enumerate().skip(skip) {
            let y = laps_top + 1 + (i - skip) as u16;
            print_at(
                w,
                4,
                y,
                &format!("#{:<3} {}", lap.index, format_ms_cs(lap.duration_ms)),
            )?;
        }
    }

    print_at(w, 2, rows.saturating_sub(2), FOOTER_HINTS)?;
    if let Some(text) = notice {
        print_at(w, 2, rows.saturating_sub(1), text)?;
    }

    w.flush()
}

pub fn draw_help(w: &mut impl Write, (_cols, rows): (u16, u16)) -> io::Result<()> {
    clear_screen(w)?;

    print_bold_at(w, 2, 1, "LAPBOARD HELP")?;
    let lines = [
        "space    Start / pause the shared clock",
        "l/Enter  Record a lap for the selected runner",
        "a        Add runners (space-separated names)",
        "up/down  Select runner (also k/j)",
        "d        Delete the selected runner",
        "r        Reset the clock and clear all laps",
        "?        This help",
        "q        Quit",
    ];
    for (i, line) in lines.iter().enumerate() {
        print_at(w, 4, 3 + i as u16, line)?;
    }
    print_at(w, 2, rows.saturating_sub(2), "Press any key to close")?;

    w.flush()
}

pub fn draw_confirm_delete(
    w: &mut impl Write,
    (_cols, rows): (u16, u16),
    name: &str,
) -> io::Result<()> {
    clear_screen(w)?;

    print_bold_at(w, 2, 2, "Delete runner")?;
    print_at(w, 2, 4, &format!("Delete \"{}\" and all recorded laps?", name))?;
    print_at(w, 2, 6, "This cannot be undone.")?;
    print_at(w, 2, rows.saturating_sub(2), "y=delete  n=cancel")?;

    w.flush()
}

pub fn draw_confirm_exit(w: &mut impl Write, (_cols, rows): (u16, u16)) -> io::Result<()> {
    clear_screen(w)?;

    print_bold_at(w, 2, 2, "Clock running")?;
    print_at(w, 2, 4, "The clock is still running. Quit anyway?")?;
    print_at(w, 2, rows.saturating_sub(2), "y=quit  n=keep timing")?;

    w.flush()
}

pub fn draw_add_runners(
    w: &mut impl Write,
    (_cols, rows): (u16, u16),
    input: &str,
) -> io::Result<()> {
    clear_screen(w)?;

    print_bold_at(w, 2, 2, "Add runners")?;
    print_at(w, 2, 4, "Names, separated by spaces:")?;
    print_at(w, 2, 6, &format!("> {}_", input))?;
    print_at(w, 2, rows.saturating_sub(2), "Enter=add  Esc=cancel")?;

    w.flush()
}

#[cfg(test)]
mod tests {
    use super::window_start;

    #[test]
    fn test_window_start_tracks_cursor() {
        assert_eq!(window_start(0, 3, 5), 0); // everything fits
        assert_eq!(window_start(2, 10, 5), 0);
        assert_eq!(window_start(7, 10, 5), 3); // cursor sits at the window's last row
        assert_eq!(window_start(9, 10, 5), 5); // clamped to the tail
    }
}
