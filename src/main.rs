// src/main.rs
//
// Interactive two-player terminal session over the chess_core engine.

use std::error::Error;
use std::fmt;
use std::io::{self, Write};

use chess_core::{CastleSide, Game, MoveError, PieceKind, SaveError, Square};

const DEFAULT_SUMMARY_FILENAME: &str = "chess_summary.json";
const DEFAULT_PGN_FILENAME: &str = "chess_game.pgn";

// --- Input Parsing ---

#[derive(Debug)]
enum UserInput {
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    },
    CastleKingside,
    CastleQueenside,
    Command(Command),
}

#[derive(Debug)]
enum Command {
    Left,
    Right,
    Start,
    End,
    GoTo(usize),
    TakeBack,
    Flip,
    Fen,
    Pgn,
    SavePgn(String),
    SaveSummary(String),
    New,
    Help,
    Quit,
}

#[derive(Debug)]
enum CommandError {
    UnknownCommand(String),
    InvalidArgument(String),
    MoveError(MoveError),
    SaveError(SaveError),
    IoError(io::Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(cmd) => {
                write!(f, "Unknown command: '{}'. Type 'help' for commands.", cmd)
            }
            CommandError::InvalidArgument(arg) => write!(f, "Invalid argument: '{}'", arg),
            CommandError::MoveError(e) => write!(f, "{}", e),
            CommandError::SaveError(e) => write!(f, "Save error: {}", e),
            CommandError::IoError(e) => write!(f, "Input/Output error: {}", e),
        }
    }
}

impl Error for CommandError {}

impl From<MoveError> for CommandError {
    fn from(e: MoveError) -> Self {
        CommandError::MoveError(e)
    }
}

impl From<SaveError> for CommandError {
    fn from(e: SaveError) -> Self {
        CommandError::SaveError(e)
    }
}

impl From<io::Error> for CommandError {
    fn from(e: io::Error) -> Self {
        CommandError::IoError(e)
    }
}

/// Parses a line of user input: castle notation first, then commands, then
/// coordinate moves like "e2e4" or "e7e8q".
fn parse_user_input(input: &str) -> Result<UserInput, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    match lower.as_str() {
        "o-o" | "0-0" => return Ok(UserInput::CastleKingside),
        "o-o-o" | "0-0-0" => return Ok(UserInput::CastleQueenside),
        _ => {}
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let word = parts.next().unwrap_or("").to_lowercase();
    let argument = parts.next().unwrap_or("").trim();

    match word.as_str() {
        "left" | "back" => return Ok(UserInput::Command(Command::Left)),
        "right" | "fwd" => return Ok(UserInput::Command(Command::Right)),
        "start" => return Ok(UserInput::Command(Command::Start)),
        "end" => return Ok(UserInput::Command(Command::End)),
        "goto" => {
            let index: usize = argument
                .parse()
                .map_err(|_| CommandError::InvalidArgument(argument.to_string()))?;
            return Ok(UserInput::Command(Command::GoTo(index)));
        }
        "takeback" | "undo" => return Ok(UserInput::Command(Command::TakeBack)),
        "flip" => return Ok(UserInput::Command(Command::Flip)),
        "fen" => return Ok(UserInput::Command(Command::Fen)),
        "pgn" => return Ok(UserInput::Command(Command::Pgn)),
        "savepgn" => {
            let filename = if argument.is_empty() {
                DEFAULT_PGN_FILENAME
            } else {
                argument
            };
            return Ok(UserInput::Command(Command::SavePgn(filename.to_string())));
        }
        "save" => {
            let filename = if argument.is_empty() {
                DEFAULT_SUMMARY_FILENAME
            } else {
                argument
            };
            return Ok(UserInput::Command(Command::SaveSummary(filename.to_string())));
        }
        "new" => return Ok(UserInput::Command(Command::New)),
        "help" | "?" => return Ok(UserInput::Command(Command::Help)),
        "quit" | "exit" => return Ok(UserInput::Command(Command::Quit)),
        _ => {}
    }

    parse_coordinate_move(trimmed)
}

fn parse_coordinate_move(input: &str) -> Result<UserInput, CommandError> {
    if !input.is_ascii() || !(4..=5).contains(&input.len()) {
        return Err(CommandError::UnknownCommand(input.to_string()));
    }
    let from = Square::from_algebraic(&input[0..2])
        .ok_or_else(|| CommandError::InvalidArgument(input.to_string()))?;
    let to = Square::from_algebraic(&input[2..4])
        .ok_or_else(|| CommandError::InvalidArgument(input.to_string()))?;
    let promotion = match input[4..].chars().next().map(|c| c.to_ascii_lowercase()) {
        None => None,
        Some('q') => Some(PieceKind::Queen),
        Some('r') => Some(PieceKind::Rook),
        Some('b') => Some(PieceKind::Bishop),
        Some('n') => Some(PieceKind::Knight),
        Some(other) => {
            return Err(CommandError::InvalidArgument(format!(
                "promotion letter '{}', use q, r, b or n",
                other
            )))
        }
    };
    Ok(UserInput::Move { from, to, promotion })
}

// --- Dispatch ---

/// Applies a coordinate move, routing through the promotion and en passant
/// operations when the request matches one.
fn play_move(
    game: &mut Game,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Result<(), CommandError> {
    if let Some(kind) = promotion {
        game.apply_promotion(from, to, kind)?;
        return Ok(());
    }
    if let Some(offer) = game.en_passant_option(from) {
        if offer.dest == to {
            game.apply_en_passant(from, to, offer.offset)?;
            return Ok(());
        }
    }
    game.apply_move(from, to)?;
    Ok(())
}

/// Runs one parsed command. Returns true when the session should end.
fn handle_command(game: &mut Game, command: Command) -> Result<bool, CommandError> {
    match command {
        Command::Left => game.go_left(),
        Command::Right => game.go_right(),
        Command::Start => game.go_far_left(),
        Command::End => game.go_far_right(),
        Command::GoTo(index) => game.go_to(index),
        Command::TakeBack => game.take_back(),
        Command::Flip => game.flip(),
        Command::Fen => println!("{}", game.current_fen()),
        Command::Pgn => println!("{}", game.game_pgn(&game.pgn_result_tag())),
        Command::SavePgn(filename) => {
            game.save_pgn_to_file(&filename)?;
            println!("PGN saved to {}", filename);
        }
        Command::SaveSummary(filename) => {
            game.save_summary_to_file(&filename)?;
            println!("Summary saved to {}", filename);
        }
        Command::New => game.reset(),
        Command::Help => print_help(),
        Command::Quit => return Ok(true),
    }
    Ok(false)
}

fn print_help() {
    println!("Moves:");
    println!("  e2e4            move a piece (en passant is routed automatically)");
    println!("  e7e8q           promote (q, r, b or n)");
    println!("  0-0 / 0-0-0     castle kingside / queenside (O-O works too)");
    println!("History:");
    println!("  left, right     step one ply back / forward");
    println!("  start, end      jump to the initial / latest position");
    println!("  goto N          jump to ply N (0-based)");
    println!("  takeback        delete the latest move");
    println!("Other:");
    println!("  flip            rotate the board");
    println!("  fen             print the current FEN");
    println!("  pgn             print the game PGN");
    println!("  savepgn [file]  write the PGN to a file");
    println!("  save [file]     write a JSON game summary to a file");
    println!("  new             start a new game");
    println!("  help, quit");
}

// --- Main Loop ---

fn main() -> Result<(), Box<dyn Error>> {
    let mut game = Game::new();
    println!("chess_core - type 'help' for commands.");

    loop {
        println!("\n{}", game);
        if game.is_finished() {
            print!("(game over) > ");
        } else {
            print!("{:?}> ", game.side_to_move());
        }
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let outcome = parse_user_input(&line).and_then(|input| match input {
            UserInput::Move { from, to, promotion } => {
                play_move(&mut game, from, to, promotion).map(|_| false)
            }
            UserInput::CastleKingside => {
                let side = game.side_to_move();
                game.apply_castle(side, CastleSide::KingSide)
                    .map(|_| false)
                    .map_err(CommandError::from)
            }
            UserInput::CastleQueenside => {
                let side = game.side_to_move();
                game.apply_castle(side, CastleSide::QueenSide)
                    .map(|_| false)
                    .map_err(CommandError::from)
            }
            UserInput::Command(command) => handle_command(&mut game, command),
        });

        match outcome {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => println!("Error: {}", e),
        }
    }

    println!("Goodbye.");
    Ok(())
}
