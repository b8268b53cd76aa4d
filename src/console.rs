use std::io::{BufRead, Write};

use color_eyre::Result;
use rand::Rng;

use crate::ports::spotify::{SpotifyApiUser, SpotifyClient};
use crate::services::spotify::diff::LibraryDiffService;

const MENU: &str = "--- Main Menu ---
1. Find all unsaved songs in playlists
2. Find all saved songs not in any playlists
3. Return a random saved album
4. List saved songs
Or press ENTER to exit
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    FindUnsaved,
    FindOrphaned,
    RandomAlbum,
    ListSaved,
    Exit,
    Invalid,
}

impl MenuChoice {
    pub fn parse(line: &str) -> Self {
        match line.trim_end_matches(['\r', '\n']) {
            "1" => MenuChoice::FindUnsaved,
            "2" => MenuChoice::FindOrphaned,
            "3" => MenuChoice::RandomAlbum,
            "4" => MenuChoice::ListSaved,
            "" => MenuChoice::Exit,
            _ => MenuChoice::Invalid,
        }
    }
}

/// Show the menu and read one answer. End of input counts as exit.
fn read_choice<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> std::io::Result<MenuChoice> {
    write!(output, "{}", MENU)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(MenuChoice::Exit);
    }
    Ok(MenuChoice::parse(&line))
}

/// Interactive loop over the diff operations until the user presses ENTER
pub async fn run_menu<C, R, W, G>(
    service: &LibraryDiffService<C>,
    user: &SpotifyApiUser,
    saved_count: usize,
    rng: &mut G,
    input: &mut R,
    output: &mut W,
) -> Result<()>
where
    C: SpotifyClient,
    R: BufRead,
    W: Write,
    G: Rng,
{
    loop {
        let choice = read_choice(input, output)?;
        log::debug!("Menu choice: {:?}", choice);

        match choice {
            MenuChoice::FindUnsaved => {
                writeln!(output, "\nChecking playlists for unsaved songs...")?;
                service.find_unsaved_in_playlists(user, output).await?;
            }
            MenuChoice::FindOrphaned => {
                writeln!(output, "\nChecking for saved songs not in any playlists...")?;
                service.find_saved_not_in_playlists(user, output).await?;
            }
            MenuChoice::RandomAlbum => {
                writeln!(output, "\nChecking saved albums...")?;
                service.random_saved_album(rng, output).await?;
            }
            MenuChoice::ListSaved => {
                writeln!(output, "\nYour first {} saved songs:", saved_count)?;
                service.list_saved_tracks(saved_count, output).await?;
            }
            MenuChoice::Exit => return Ok(()),
            MenuChoice::Invalid => {
                writeln!(output, "\nPick a valid option or press ENTER to exit.")?;
            }
        }
    }
}

/// Keep the window open until the user acknowledges
pub fn press_enter_to_exit<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> std::io::Result<()> {
    write!(output, "Press ENTER to exit.")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}
