use std::{io, sync::Arc};

use tokio::io::{AsyncBufReadExt, BufReader};
use veggie_patch::{Command, CellView, Coordinate, Garden, GardenConfig, Ripeness, VegetableKind};

/// Pixel size of one cell for `click X Y` input.
const CELL_SIZE: f64 = 50.0;

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let config =
        GardenConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    log::info!("Starting with {config:?}");

    let mut garden = Garden::new(&config, tokio::runtime::Handle::current());
    garden.subscribe_all(Arc::new(|at: Coordinate, view: &CellView| {
        println!("{}", serde_json::json!({ "coordinate": at, "cell": view }));
    }));

    println!("🥕 Veggie patch {}x{} ready", config.cols, config.rows);
    println!("   up / down / left / right   move the farmer");
    println!("   click X Y                  move the farmer to a pixel position");
    println!("   c / t                      plant a carrot / turnip");
    println!("   f / g                      apply fertilizer / grass");
    println!("   r                          harvest");
    println!("   show / quit");
    println!("   JSON commands are accepted too, e.g. {{\"MoveCursorTo\": [3, 4]}}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" => break,
            "show" => {
                print!("{}", render(&garden));
                continue;
            }
            _ => {}
        }
        match parse_command(line) {
            Some(command) => {
                garden.dispatch(command);
            }
            None => log::warn!("Unrecognised input {line:?}"),
        }
    }
    Ok(())
}

fn parse_command(line: &str) -> Option<Command> {
    if line.starts_with('{') || line.starts_with('"') {
        return serde_json::from_str(line)
            .map_err(|e| log::warn!("Invalid JSON command: {e}"))
            .ok();
    }
    if let Some(rest) = line.strip_prefix("click ") {
        let mut parts = rest.split_whitespace().map(str::parse::<f64>);
        return match (parts.next(), parts.next()) {
            (Some(Ok(x)), Some(Ok(y))) => Command::from_click(x, y, CELL_SIZE),
            _ => None,
        };
    }
    Command::from_key(line)
}

fn render(garden: &Garden) -> String {
    let grid = garden.grid();
    let mut out = String::new();
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let at = Coordinate { row, col };
            let glyph = if at == garden.cursor() {
                '@'
            } else {
                grid.view(at).map_or('?', |view| symbol(&view))
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

fn symbol(view: &CellView) -> char {
    match view.vegetable {
        Some(planted) => {
            let c = match planted.kind {
                VegetableKind::Carrot => 'c',
                VegetableKind::Turnip => 't',
            };
            if planted.ripeness == Ripeness::Ripe {
                c.to_ascii_uppercase()
            } else {
                c
            }
        }
        None if view.fertilizer_active => 'f',
        None if view.grass_active => '"',
        None => '.',
    }
}
